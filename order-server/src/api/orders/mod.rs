//! Staff order API
//!
//! All mutations go through `OrderManager`; the handlers only authenticate
//! and translate.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).delete(handler::cancel))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/payment-status", put(handler::update_payment_status))
}
