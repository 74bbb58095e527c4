use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::auth::GuardError;
use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("notification must target exactly one user or customer")]
    TargetInvalid,
    #[error("invalid notification channel '{0}'")]
    InvalidChannel(String),
    #[error("notification {0} not found")]
    NotFound(i64),
    #[error("recipient {recipient} has no address for {channel}")]
    RecipientUnreachable { recipient: String, channel: String },
    #[error("notification {0} has already been sent")]
    AlreadySent(i64),
    #[error("notification {id} reached its retry limit after {attempts} attempts")]
    RetryExhausted { id: i64, attempts: i32 },
    #[error("delivery of notification {notification_id} failed (attempt {attempts}): {reason}")]
    DeliveryFailed {
        notification_id: i64,
        attempts: i32,
        reason: String,
    },
    #[error("order {0} not found")]
    OrderNotFound(i64),
    #[error("recipient is outside your scope")]
    OutOfScope,
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err {
            DispatchError::TargetInvalid => {
                AppError::with_message(ErrorCode::NotificationTargetInvalid, message)
            }
            DispatchError::InvalidChannel(_) => AppError::validation(message),
            DispatchError::NotFound(id) => {
                AppError::with_message(ErrorCode::NotificationNotFound, message)
                    .with_detail("notification_id", id)
            }
            DispatchError::RecipientUnreachable { .. } => {
                AppError::with_message(ErrorCode::RecipientUnreachable, message)
            }
            DispatchError::AlreadySent(id) => {
                AppError::with_message(ErrorCode::NotificationAlreadySent, message)
                    .with_detail("notification_id", id)
            }
            DispatchError::RetryExhausted { id, attempts } => {
                AppError::with_message(ErrorCode::NotificationRetryExhausted, message)
                    .with_detail("notification_id", id)
                    .with_detail("retry_count", attempts)
            }
            DispatchError::DeliveryFailed {
                notification_id,
                attempts,
                ..
            } => AppError::with_message(ErrorCode::NotificationDeliveryFailed, message)
                .with_detail("notification_id", notification_id)
                .with_detail("retry_count", attempts),
            DispatchError::OrderNotFound(_) => {
                AppError::with_message(ErrorCode::OrderNotFound, message)
            }
            DispatchError::OutOfScope => AppError::forbidden(message),
            DispatchError::Guard(e) => e.into(),
            DispatchError::Repo(e) => e.into(),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
