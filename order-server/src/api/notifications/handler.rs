use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::AppResult;
use shared::models::{Notification, NotificationSend};

use crate::auth::Actor;
use crate::core::ServerState;

/// POST /api/notifications
///
/// A failed delivery answers with `NotificationDeliveryFailed`; the row is
/// kept and its id is in the error details.
pub async fn send(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<NotificationSend>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    let notification = state.notifications.send_for(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// GET /api/notifications/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<Json<Notification>> {
    Ok(Json(state.notifications.get_for(&actor, id).await?))
}

/// POST /api/notifications/{id}/retry
pub async fn retry(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<Json<Notification>> {
    Ok(Json(state.notifications.retry_for(&actor, id).await?))
}
