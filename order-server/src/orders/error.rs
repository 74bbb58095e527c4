//! Order lifecycle errors

use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

use crate::auth::GuardError;
use crate::db::repository::RepoError;
use crate::tables::AllocError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order must contain at least one item")]
    Empty,
    #[error("invalid order channel '{0}'")]
    InvalidChannel(String),
    #[error("invalid quantity {quantity} for menu item {menu_item_id}")]
    InvalidQuantity { menu_item_id: i64, quantity: i32 },
    #[error("invalid order status '{0}'")]
    InvalidStatus(String),
    #[error("invalid payment status '{0}'")]
    InvalidPaymentStatus(String),
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order {id} is {status} and can no longer be cancelled")]
    NotCancellable { id: i64, status: OrderStatus },
    #[error("dine-in orders require a table")]
    TableRequired,
    #[error("delivery orders require a delivery location")]
    DeliveryLocationRequired,
    #[error("delivery location {0} not found")]
    DeliveryLocationNotFound(i64),
    #[error("invalid delivery address: {0}")]
    InvalidDeliveryAddress(String),
    #[error("menu item {0} not found")]
    MenuItemNotFound(i64),
    #[error("menu item {0} is unavailable")]
    MenuItemUnavailable(i64),
    #[error("order {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Table(#[from] AllocError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Repo(err.into())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Empty => AppError::with_message(ErrorCode::OrderEmpty, message),
            OrderError::InvalidChannel(_) => {
                AppError::with_message(ErrorCode::InvalidOrderChannel, message)
            }
            OrderError::InvalidQuantity { menu_item_id, .. } => {
                AppError::with_message(ErrorCode::InvalidItemQuantity, message)
                    .with_detail("menu_item_id", menu_item_id)
            }
            OrderError::InvalidStatus(_) => {
                AppError::with_message(ErrorCode::InvalidOrderStatus, message)
            }
            OrderError::InvalidPaymentStatus(_) => {
                AppError::with_message(ErrorCode::InvalidPaymentStatus, message)
            }
            OrderError::InvalidTransition { from, to } => {
                AppError::with_message(ErrorCode::InvalidStatusTransition, message)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::NotCancellable { id, .. } => {
                AppError::with_message(ErrorCode::OrderNotCancellable, message)
                    .with_detail("order_id", id)
            }
            OrderError::TableRequired => AppError::with_message(ErrorCode::TableRequired, message),
            OrderError::DeliveryLocationRequired => {
                AppError::with_message(ErrorCode::DeliveryLocationRequired, message)
            }
            OrderError::DeliveryLocationNotFound(_) => {
                AppError::with_message(ErrorCode::DeliveryLocationNotFound, message)
            }
            OrderError::InvalidDeliveryAddress(_) => AppError::validation(message),
            OrderError::MenuItemNotFound(id) => {
                AppError::with_message(ErrorCode::MenuItemNotFound, message)
                    .with_detail("menu_item_id", id)
            }
            OrderError::MenuItemUnavailable(id) => {
                AppError::with_message(ErrorCode::MenuItemUnavailable, message)
                    .with_detail("menu_item_id", id)
            }
            OrderError::NotFound(_) => AppError::with_message(ErrorCode::OrderNotFound, message),
            OrderError::Guard(e) => e.into(),
            OrderError::Table(e) => e.into(),
            OrderError::Repo(e) => e.into(),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCategory;

    #[test]
    fn validation_errors_are_bad_requests() {
        for err in [
            OrderError::Empty,
            OrderError::InvalidChannel("drone".into()),
            OrderError::InvalidTransition {
                from: OrderStatus::Served,
                to: OrderStatus::Pending,
            },
        ] {
            assert_eq!(AppError::from(err).http_status(), http::StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn conflicts_and_not_found() {
        let cancel = AppError::from(OrderError::NotCancellable {
            id: 4,
            status: OrderStatus::Ready,
        });
        assert_eq!(cancel.http_status(), http::StatusCode::CONFLICT);

        let missing = AppError::from(OrderError::NotFound(4));
        assert_eq!(missing.http_status(), http::StatusCode::NOT_FOUND);
        assert_eq!(missing.code.category(), ErrorCategory::Order);

        let occupied = AppError::from(OrderError::Table(AllocError::TableOccupied(2)));
        assert_eq!(occupied.code, ErrorCode::TableOccupied);
    }
}
