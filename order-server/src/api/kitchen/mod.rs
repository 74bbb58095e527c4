//! 厨房看板 API
//!
//! The board is polled; responses are never cached and advertise the poll
//! interval in `X-Poll-Interval` (seconds).

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/kitchen", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/branches/{branch_id}/tickets", get(handler::board))
        .route("/tickets/{id}/status", put(handler::update_ticket_status))
}
