//! Kitchen Ticket Model (KDS)

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{OrderChannel, OrderStatus, ParseEnumError};

/// Kitchen-facing status; coarser operational view of the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum TicketStatus {
    Pending,
    InProgress,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl TicketStatus {
    /// Statuses shown on the kitchen board
    pub const IN_FLIGHT: [TicketStatus; 4] = [
        TicketStatus::Pending,
        TicketStatus::InProgress,
        TicketStatus::Preparing,
        TicketStatus::Ready,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Preparing => "Preparing",
            Self::Ready => "Ready",
            Self::Served => "Served",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        Self::IN_FLIGHT.contains(self)
    }
}

impl From<OrderStatus> for TicketStatus {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => Self::Pending,
            OrderStatus::InProgress => Self::InProgress,
            OrderStatus::Ready => Self::Ready,
            OrderStatus::Served => Self::Served,
            OrderStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl FromStr for TicketStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "InProgress" => Ok(Self::InProgress),
            "Preparing" => Ok(Self::Preparing),
            "Ready" => Ok(Self::Ready),
            "Served" => Ok(Self::Served),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEnumError::new("ticket status", other)),
        }
    }
}

/// Kitchen ticket row (1:1 with order)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct KitchenTicket {
    pub id: i64,
    pub order_id: i64,
    pub branch_id: i64,
    pub status: TicketStatus,
    /// Wait-time basis, independent of the order timestamp
    pub created_at: i64,
    pub updated_at: i64,
}

/// Wait-time priority bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Normal,
    Warning,
    Urgent,
}

/// Line shown on a kitchen ticket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitchenTicketItem {
    pub name: String,
    pub quantity: i32,
}

/// Derived kitchen board entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenTicketView {
    pub ticket_id: i64,
    pub order_id: i64,
    pub status: TicketStatus,
    pub channel: OrderChannel,
    pub table_label: String,
    pub minutes_waiting: i64,
    pub priority: TicketPriority,
    pub created_at: i64,
    pub items: Vec<KitchenTicketItem>,
}

/// Update ticket status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStatusUpdate {
    pub status: String,
}
