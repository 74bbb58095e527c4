//! Order Model
//!
//! An order aggregate is the order row plus its line items, kitchen ticket
//! and payment record. All amounts are in currency units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{DeliveryLocation, KitchenTicket, ParseEnumError};

/// Order channel (点单渠道)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "kebab-case"))]
pub enum OrderChannel {
    DineIn,
    Takeaway,
    Delivery,
}

impl OrderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DineIn => "dine-in",
            Self::Takeaway => "takeaway",
            Self::Delivery => "delivery",
        }
    }
}

impl FromStr for OrderChannel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine-in" => Ok(Self::DineIn),
            "takeaway" => Ok(Self::Takeaway),
            "delivery" => Ok(Self::Delivery),
            other => Err(ParseEnumError::new("order channel", other)),
        }
    }
}

impl fmt::Display for OrderChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle status
///
/// `Pending → InProgress → Ready → Served`, plus `Pending | InProgress → Cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum OrderStatus {
    Pending,
    InProgress,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Ready => "Ready",
            Self::Served => "Served",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Served | Self::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "InProgress" => Ok(Self::InProgress),
            "Ready" => Ok(Self::Ready),
            "Served" => Ok(Self::Served),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEnumError::new("order status", other)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order-level payment flag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "Unpaid",
            Self::Paid => "Paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Paid" => Ok(Self::Paid),
            other => Err(ParseEnumError::new("payment status", other)),
        }
    }
}

/// Payment record status, kept in lockstep with [`PaymentStatus`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentRecordStatus {
    Pending,
    Completed,
}

/// Order row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub restaurant_id: i64,
    pub branch_id: i64,
    /// Set for customer-initiated orders
    pub customer_id: Option<i64>,
    /// Staff user who keyed the order in
    pub created_by: Option<i64>,
    pub channel: OrderChannel,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: f64,
    pub table_id: Option<i64>,
    pub delivery_location_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item (price snapshot taken at order time)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
}

/// Payment stub (1:1 with order)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: i64,
    pub order_id: i64,
    pub method: String,
    pub status: PaymentRecordStatus,
    pub amount: f64,
    pub paid_at: Option<i64>,
}

/// Full order aggregate as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLineItem>,
    pub kitchen_ticket: Option<KitchenTicket>,
    pub payment: Option<PaymentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_location: Option<DeliveryLocation>,
}

/// Order row only, without the related rows
impl From<Order> for OrderDetail {
    fn from(order: Order) -> Self {
        Self {
            order,
            items: Vec::new(),
            kitchen_ticket: None,
            payment: None,
            delivery_location: None,
        }
    }
}

// =============================================================================
// Request payloads
// =============================================================================

/// One requested line; duplicates of the same menu item are merged server-side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    pub quantity: i32,
}

/// Inline delivery address submitted with an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAddressInput {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Create order payload (shared by staff and customer endpoints)
///
/// `channel` stays a string so an unknown value is reported as a domain
/// validation error instead of a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCreate {
    pub channel: String,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    pub branch_id: Option<i64>,
    pub table_id: Option<i64>,
    pub delivery_location_id: Option<i64>,
    pub delivery_address: Option<DeliveryAddressInput>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Update order status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
}

/// Update payment status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub payment_status: String,
}

/// List filter (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub branch_id: Option<i64>,
    /// Inclusive lower bound on created_at (unix millis)
    pub from: Option<i64>,
    /// Exclusive upper bound on created_at (unix millis)
    pub to: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderChannel::DineIn).unwrap(),
            "\"dine-in\""
        );
        assert_eq!("takeaway".parse::<OrderChannel>(), Ok(OrderChannel::Takeaway));
        assert!("drive-thru".parse::<OrderChannel>().is_err());
        assert!("Dine-In".parse::<OrderChannel>().is_err());
    }

    #[test]
    fn status_parsing_is_exact() {
        assert_eq!("InProgress".parse::<OrderStatus>(), Ok(OrderStatus::InProgress));
        assert!("in_progress".parse::<OrderStatus>().is_err());
        assert!("Preparing".parse::<OrderStatus>().is_err());
        assert_eq!("Paid".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert!("Refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Served.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn create_payload_defaults_items() {
        let payload: OrderCreate = serde_json::from_str(r#"{"channel":"takeaway"}"#).unwrap();
        assert!(payload.items.is_empty());
        assert!(payload.table_id.is_none());
    }
}
