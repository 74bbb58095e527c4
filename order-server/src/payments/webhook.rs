//! Payment provider webhook
//!
//! Verify signature → parse → claim event id (insert first, check
//! rows_affected) → apply. Only `payment.succeeded` changes anything; it goes
//! through the same "mark Paid" path as the staff endpoint.

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::util::now_millis;
use sqlx::SqlitePool;
use thiserror::Error;

use super::signature::{SignatureError, verify_signature};
use crate::db::repository::{RepoError, webhook_event};
use crate::orders::{OrderError, OrderManager};

pub const PAYMENT_SUCCEEDED: &str = "payment.succeeded";

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    pub order_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    Duplicate,
    /// Verified, but nothing to do (unknown type, unknown or cancelled order)
    Ignored,
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook signature rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("malformed webhook payload: {0}")]
    Malformed(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Signature(e) => {
                crate::security_log!(WARN, "webhook_signature_rejected", reason = %e);
                AppError::new(ErrorCode::WebhookSignatureInvalid)
            }
            WebhookError::Malformed(msg) => AppError::invalid_request(msg),
            WebhookError::Repo(e) => e.into(),
        }
    }
}

#[derive(Clone)]
pub struct PaymentWebhook {
    pool: SqlitePool,
    orders: OrderManager,
    secret: String,
    tolerance_secs: i64,
}

impl PaymentWebhook {
    pub fn new(pool: SqlitePool, orders: OrderManager, secret: String, tolerance_secs: i64) -> Self {
        Self {
            pool,
            orders,
            secret,
            tolerance_secs,
        }
    }

    pub async fn handle(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome, WebhookError> {
        let header = signature_header.ok_or(SignatureError::MalformedHeader)?;
        verify_signature(
            body,
            header,
            &self.secret,
            self.tolerance_secs,
            now_millis() / 1000,
        )?;

        let event: WebhookEvent =
            serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Payment webhook received");

        if !webhook_event::record_once(&self.pool, &event.id, &event.event_type, now_millis()).await? {
            tracing::info!(event_id = %event.id, "Duplicate webhook event, skipping");
            return Ok(WebhookOutcome::Duplicate);
        }

        if event.event_type != PAYMENT_SUCCEEDED {
            tracing::debug!(event_type = %event.event_type, "Unhandled webhook event type");
            return Ok(WebhookOutcome::Ignored);
        }
        let Some(order_id) = event.data.order_id else {
            tracing::warn!(event_id = %event.id, "payment.succeeded without order_id");
            return Ok(WebhookOutcome::Ignored);
        };

        match self.orders.mark_paid(order_id).await {
            Ok(_) => Ok(WebhookOutcome::Processed),
            Err(OrderError::Repo(e)) => {
                // 基础设施故障：释放事件让服务商重投
                if let Err(forget_err) = webhook_event::forget(&self.pool, &event.id).await {
                    tracing::error!(event_id = %event.id, error = %forget_err, "Failed to release webhook claim");
                }
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(event_id = %event.id, order_id, error = %e, "Payment webhook not applied");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }
}
