//! Unified error codes for the order platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 8xxx: Notification errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Principal is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Staff principal carries neither a restaurant nor a branch scope
    ScopeMissing = 2002,
    /// Branch-bound principal tried to act on another branch
    BranchOverrideDenied = 2003,
    /// Endpoint is reserved for staff principals
    StaffRequired = 2004,
    /// Endpoint is reserved for customer principals
    CustomerRequired = 2005,

    // ==================== 3xxx: Tenant ====================
    /// Restaurant not found
    RestaurantNotFound = 3002,
    /// Branch not found (or not part of the caller's restaurant)
    BranchNotFound = 3101,
    /// Branch must be supplied explicitly
    BranchRequired = 3102,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no line items
    OrderEmpty = 4007,
    /// Order channel is not one of dine-in / takeaway / delivery
    InvalidOrderChannel = 4008,
    /// Requested status change is not an edge of the order state machine
    InvalidStatusTransition = 4009,
    /// Order can only be cancelled while pending
    OrderNotCancellable = 4010,
    /// Line item quantity must be at least one
    InvalidItemQuantity = 4011,
    /// Delivery orders need a delivery location
    DeliveryLocationRequired = 4012,
    /// Delivery location not found
    DeliveryLocationNotFound = 4013,
    /// Dine-in orders need a table
    TableRequired = 4014,
    /// Unknown order status value
    InvalidOrderStatus = 4015,
    /// Kitchen ticket not found
    KitchenTicketNotFound = 4101,
    /// Unknown kitchen ticket status value
    InvalidTicketStatus = 4102,
    /// Ticket or its order is already served or cancelled
    KitchenTicketClosed = 4103,

    // ==================== 5xxx: Payment ====================
    /// Payment record not found
    PaymentNotFound = 5006,
    /// Unknown payment status value
    InvalidPaymentStatus = 5007,
    /// Payment provider signature could not be verified
    WebhookSignatureInvalid = 5101,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found in the restaurant's menu
    MenuItemNotFound = 6001,
    /// Menu item exists but is not currently orderable
    MenuItemUnavailable = 6002,

    // ==================== 7xxx: Table ====================
    /// Table not found in the branch
    TableNotFound = 7001,
    /// Table is held by another order
    TableOccupied = 7002,

    // ==================== 8xxx: Notification ====================
    /// Notification not found
    NotificationNotFound = 8001,
    /// Exactly one of user / customer must be targeted
    NotificationTargetInvalid = 8002,
    /// Notification was already delivered
    NotificationAlreadySent = 8003,
    /// Notification reached its retry ceiling
    NotificationRetryExhausted = 8004,
    /// Channel transport rejected the delivery
    NotificationDeliveryFailed = 8005,
    /// Recipient has no address for the requested channel
    RecipientUnreachable = 8006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// System busy (queue saturated)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::ScopeMissing => "Account is not bound to a restaurant or branch",
            ErrorCode::BranchOverrideDenied => "Branch staff cannot act on another branch",
            ErrorCode::StaffRequired => "Staff account required",
            ErrorCode::CustomerRequired => "Customer account required",

            // Tenant
            ErrorCode::RestaurantNotFound => "Restaurant not found",
            ErrorCode::BranchNotFound => "Branch not found",
            ErrorCode::BranchRequired => "Branch must be specified",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::InvalidOrderChannel => "Invalid order channel",
            ErrorCode::InvalidStatusTransition => "Invalid order status transition",
            ErrorCode::OrderNotCancellable => "Only pending orders can be cancelled",
            ErrorCode::InvalidItemQuantity => "Item quantity must be at least 1",
            ErrorCode::DeliveryLocationRequired => "Delivery orders require a delivery location",
            ErrorCode::DeliveryLocationNotFound => "Delivery location not found",
            ErrorCode::TableRequired => "Dine-in orders require a table",
            ErrorCode::InvalidOrderStatus => "Invalid order status",
            ErrorCode::KitchenTicketNotFound => "Kitchen ticket not found",
            ErrorCode::InvalidTicketStatus => "Invalid kitchen ticket status",
            ErrorCode::KitchenTicketClosed => "Kitchen ticket is closed",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::InvalidPaymentStatus => "Invalid payment status",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature verification failed",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu item is not available",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",

            // Notification
            ErrorCode::NotificationNotFound => "Notification not found",
            ErrorCode::NotificationTargetInvalid => {
                "Notification must target exactly one user or customer"
            }
            ErrorCode::NotificationAlreadySent => "Notification has already been sent",
            ErrorCode::NotificationRetryExhausted => "Notification retry limit reached",
            ErrorCode::NotificationDeliveryFailed => "Notification delivery failed",
            ErrorCode::RecipientUnreachable => "Recipient has no address for this channel",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::ScopeMissing),
            2003 => Ok(ErrorCode::BranchOverrideDenied),
            2004 => Ok(ErrorCode::StaffRequired),
            2005 => Ok(ErrorCode::CustomerRequired),

            // Tenant
            3002 => Ok(ErrorCode::RestaurantNotFound),
            3101 => Ok(ErrorCode::BranchNotFound),
            3102 => Ok(ErrorCode::BranchRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::InvalidOrderChannel),
            4009 => Ok(ErrorCode::InvalidStatusTransition),
            4010 => Ok(ErrorCode::OrderNotCancellable),
            4011 => Ok(ErrorCode::InvalidItemQuantity),
            4012 => Ok(ErrorCode::DeliveryLocationRequired),
            4013 => Ok(ErrorCode::DeliveryLocationNotFound),
            4014 => Ok(ErrorCode::TableRequired),
            4015 => Ok(ErrorCode::InvalidOrderStatus),
            4101 => Ok(ErrorCode::KitchenTicketNotFound),
            4102 => Ok(ErrorCode::InvalidTicketStatus),
            4103 => Ok(ErrorCode::KitchenTicketClosed),

            // Payment
            5006 => Ok(ErrorCode::PaymentNotFound),
            5007 => Ok(ErrorCode::InvalidPaymentStatus),
            5101 => Ok(ErrorCode::WebhookSignatureInvalid),

            // Menu
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemUnavailable),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),

            // Notification
            8001 => Ok(ErrorCode::NotificationNotFound),
            8002 => Ok(ErrorCode::NotificationTargetInvalid),
            8003 => Ok(ErrorCode::NotificationAlreadySent),
            8004 => Ok(ErrorCode::NotificationRetryExhausted),
            8005 => Ok(ErrorCode::NotificationDeliveryFailed),
            8006 => Ok(ErrorCode::RecipientUnreachable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
