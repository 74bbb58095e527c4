use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, header},
};
use shared::error::AppResult;
use shared::models::{KitchenTicket, KitchenTicketView, TicketStatusUpdate};

use crate::auth::Actor;
use crate::core::ServerState;

pub const POLL_INTERVAL_HEADER: &str = "x-poll-interval";

type NoCacheHeaders = [(HeaderName, HeaderValue); 3];

fn no_cache_headers(poll_interval_secs: u64) -> NoCacheHeaders {
    [
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        ),
        (header::PRAGMA, HeaderValue::from_static("no-cache")),
        (
            HeaderName::from_static(POLL_INTERVAL_HEADER),
            HeaderValue::from(poll_interval_secs),
        ),
    ]
}

/// GET /api/kitchen/branches/{branch_id}/tickets
pub async fn board(
    State(state): State<ServerState>,
    actor: Actor,
    Path(branch_id): Path<i64>,
) -> AppResult<(NoCacheHeaders, Json<Vec<KitchenTicketView>>)> {
    let tickets = state.kitchen.list(&actor, branch_id).await?;
    Ok((
        no_cache_headers(state.config.kds_poll_interval_secs),
        Json(tickets),
    ))
}

/// PUT /api/kitchen/tickets/{id}/status
pub async fn update_ticket_status(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<TicketStatusUpdate>,
) -> AppResult<Json<KitchenTicket>> {
    Ok(Json(
        state
            .kitchen
            .update_ticket_status(&actor, id, &payload.status)
            .await?,
    ))
}
