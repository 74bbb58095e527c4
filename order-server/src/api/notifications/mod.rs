//! Notification API (staff only)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::send))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/retry", post(handler::retry))
}
