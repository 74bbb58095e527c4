//! Order state machine
//!
//! ```text
//! Pending ──► InProgress ──► Ready ──► Served
//!    │            │
//!    └────────────┴──► Cancelled
//! ```
//!
//! The payment toggle moves orders between Pending and InProgress outside
//! this table (see `OrderManager::update_payment_status`).

use shared::models::OrderStatus;

use super::error::OrderError;

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, InProgress)
            | (InProgress, Ready)
            | (Ready, Served)
            | (Pending, Cancelled)
            | (InProgress, Cancelled)
    )
}

pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}

/// Entering this status frees a held dine-in table
pub fn releases_table(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Served | OrderStatus::Cancelled)
}
