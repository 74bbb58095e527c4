//! Payment provider webhook
//!
//! POST /api/payments/webhook: raw body, authenticated by signature only

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Json, Router, routing::post};
use serde::Serialize;
use shared::error::AppResult;

use crate::core::ServerState;
use crate::payments::{SIGNATURE_HEADER, WebhookOutcome};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments/webhook", post(handle_webhook))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    received: bool,
    outcome: &'static str,
}

/// Must receive the raw body (not JSON) for signature verification
async fn handle_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let outcome = state.webhook.handle(signature, &body).await?;
    Ok(Json(WebhookAck {
        received: true,
        outcome: match outcome {
            WebhookOutcome::Processed => "processed",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::Ignored => "ignored",
        },
    }))
}
