//! Inbound payment provider integration

pub mod signature;
pub mod webhook;

pub use signature::{SIGNATURE_HEADER, SignatureError, sign, verify_signature};
pub use webhook::{PaymentWebhook, WebhookError, WebhookEvent, WebhookOutcome};
