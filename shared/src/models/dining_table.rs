//! Dining Table & Reservation Model

use serde::{Deserialize, Serialize};

/// Dining table entity (桌台)
///
/// `is_active` means "free for new seating"; an occupied table has
/// `is_active = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub branch_id: i64,
    pub number: i32,
    pub capacity: i32,
    pub is_active: bool,
}

/// Reservation recorded for a customer dine-in order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: i64,
    pub branch_id: i64,
    pub table_id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub reserved_from: i64,
    pub reserved_until: i64,
}
