//! Staff order handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::AppResult;
use shared::models::{
    Order, OrderCreate, OrderDetail, OrderListQuery, OrderStatusUpdate, Page, PaymentStatusUpdate,
};

use crate::auth::Actor;
use crate::core::ServerState;

/// POST /api/orders
pub async fn create(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    actor.require_staff()?;
    let detail = state.orders.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/orders
pub async fn list(
    State(state): State<ServerState>,
    actor: Actor,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<Page<Order>>> {
    actor.require_staff()?;
    Ok(Json(state.orders.list(&actor, &query).await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    actor.require_staff()?;
    Ok(Json(state.orders.get(&actor, id).await?))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    actor.require_staff()?;
    Ok(Json(
        state.orders.update_status(&actor, id, &payload.status).await?,
    ))
}

/// PUT /api/orders/{id}/payment-status
pub async fn update_payment_status(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> AppResult<Json<Order>> {
    actor.require_staff()?;
    Ok(Json(
        state
            .orders
            .update_payment_status(&actor, id, &payload.payment_status)
            .await?,
    ))
}

/// DELETE /api/orders/{id}
pub async fn cancel(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    actor.require_staff()?;
    state.orders.cancel(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
