//! Delivery Location Model

use serde::{Deserialize, Serialize};

/// Delivery location
///
/// Saved addresses are reused across orders. Inline addresses submitted with
/// an order are stored with `is_saved = false` and discarded with the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryLocation {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_saved: bool,
}
