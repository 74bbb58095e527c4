use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::AppResult;
use shared::models::{Order, OrderCreate, OrderDetail, OrderListQuery, Page};

use crate::auth::Actor;
use crate::core::ServerState;

/// POST /api/customer/orders
pub async fn create(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    actor.require_customer()?;
    let detail = state.orders.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/customer/orders
pub async fn list(
    State(state): State<ServerState>,
    actor: Actor,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<Page<Order>>> {
    actor.require_customer()?;
    Ok(Json(state.orders.list(&actor, &query).await?))
}

/// GET /api/customer/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    actor.require_customer()?;
    Ok(Json(state.orders.get(&actor, id).await?))
}

/// DELETE /api/customer/orders/{id}
pub async fn cancel(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    actor.require_customer()?;
    state.orders.cancel(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
