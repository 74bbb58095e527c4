//! Notification Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;

/// Delivery channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum NotificationChannel {
    Email,
    Sms,
    InApp,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Sms => "Sms",
            Self::InApp => "InApp",
        }
    }
}

impl FromStr for NotificationChannel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Email" | "email" => Ok(Self::Email),
            "Sms" | "SMS" | "sms" => Ok(Self::Sms),
            "InApp" | "in_app" | "in-app" => Ok(Self::InApp),
            other => Err(ParseEnumError::new("notification channel", other)),
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status: `Pending` until sent, `Failed` once retries are exhausted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

/// Who a notification is addressed to; exactly one side is set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NotificationTarget {
    User(i64),
    Customer(i64),
}

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub user_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub order_id: Option<i64>,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
    pub status: NotificationStatus,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub sent_at: Option<i64>,
    pub failed_at: Option<i64>,
    pub created_at: i64,
}

impl Notification {
    pub fn target(&self) -> Option<NotificationTarget> {
        match (self.user_id, self.customer_id) {
            (Some(user), None) => Some(NotificationTarget::User(user)),
            (None, Some(customer)) => Some(NotificationTarget::Customer(customer)),
            _ => None,
        }
    }
}

/// Explicit send payload
///
/// Both ids are accepted so that a request naming both (or neither) can be
/// rejected with a proper error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSend {
    pub user_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub channel: String,
    pub title: String,
    pub body: String,
    pub order_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_aliases() {
        assert_eq!("sms".parse::<NotificationChannel>(), Ok(NotificationChannel::Sms));
        assert_eq!("InApp".parse::<NotificationChannel>(), Ok(NotificationChannel::InApp));
        assert!("fax".parse::<NotificationChannel>().is_err());
    }

    #[test]
    fn target_is_exclusive() {
        let mut n = Notification {
            id: 1,
            user_id: Some(7),
            customer_id: None,
            order_id: None,
            channel: NotificationChannel::Email,
            title: "t".into(),
            body: "b".into(),
            status: NotificationStatus::Pending,
            retry_count: 0,
            last_error: None,
            sent_at: None,
            failed_at: None,
            created_at: 0,
        };
        assert_eq!(n.target(), Some(NotificationTarget::User(7)));
        n.customer_id = Some(9);
        assert_eq!(n.target(), None);
    }
}
