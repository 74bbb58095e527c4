//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::RestaurantNotFound
            | Self::BranchNotFound
            | Self::OrderNotFound
            | Self::DeliveryLocationNotFound
            | Self::KitchenTicketNotFound
            | Self::PaymentNotFound
            | Self::MenuItemNotFound
            | Self::TableNotFound
            | Self::NotificationNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::TableOccupied
            | Self::OrderNotCancellable
            | Self::KitchenTicketClosed
            | Self::NotificationAlreadySent
            | Self::NotificationRetryExhausted => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::WebhookSignatureInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::ScopeMissing
            | Self::BranchOverrideDenied
            | Self::StaffRequired
            | Self::CustomerRequired => StatusCode::FORBIDDEN,

            // 502: the channel transport refused the message
            Self::NotificationDeliveryFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient, client can retry)
            Self::NetworkError | Self::TimeoutError | Self::SystemBusy => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation / business rule)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
