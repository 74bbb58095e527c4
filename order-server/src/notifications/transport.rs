//! Channel transports
//!
//! One transport per [`NotificationChannel`]. Email and SMS go to an HTTP
//! gateway when one is configured and are only logged otherwise; in-app
//! messages are pushed through the live hub.

use async_trait::async_trait;
use serde::Serialize;
use shared::models::{Notification, NotificationChannel, NotificationTarget};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::Config;
use crate::live::{EventPublisher, LiveEvent, LiveTopic};

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved destination for one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Email(String),
    Phone(String),
    InApp(NotificationTarget),
}

impl Address {
    fn as_recipient(&self) -> String {
        match self {
            Self::Email(email) => email.clone(),
            Self::Phone(phone) => phone.clone(),
            Self::InApp(NotificationTarget::User(id)) => format!("user:{id}"),
            Self::InApp(NotificationTarget::Customer(id)) => format!("customer:{id}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub notification: Notification,
    pub address: Address,
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("gateway rejected message: {0}")]
    Rejected(String),
    #[error("gateway unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct GatewayPayload<'a> {
    to: String,
    subject: &'a str,
    body: &'a str,
    reference: i64,
}

/// Posts `{to, subject, body, reference}` as JSON to a gateway URL
pub struct HttpGatewayTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpGatewayTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationTransport for HttpGatewayTransport {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let payload = GatewayPayload {
            to: message.address.as_recipient(),
            subject: &message.notification.title,
            body: &message.notification.body,
            reference: message.notification.id,
        };
        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(TransportError::Rejected(format!("{status}: {body}")))
        }
    }
}

/// Stand-in when no gateway is configured; always succeeds
pub struct LogTransport {
    channel: NotificationChannel,
}

impl LogTransport {
    pub fn new(channel: NotificationChannel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl NotificationTransport for LogTransport {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        tracing::info!(
            channel = %self.channel,
            notification_id = message.notification.id,
            to = %message.address.as_recipient(),
            title = %message.notification.title,
            "Notification delivered (log only)"
        );
        Ok(())
    }
}

/// Pushes the notification row to the recipient's live topic
pub struct InAppTransport {
    publisher: Arc<dyn EventPublisher>,
}

impl InAppTransport {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl NotificationTransport for InAppTransport {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let topic = match message.address {
            Address::InApp(NotificationTarget::User(id)) => LiveTopic::User(id),
            Address::InApp(NotificationTarget::Customer(id)) => LiveTopic::Customer(id),
            _ => {
                return Err(TransportError::Rejected(
                    "in-app transport needs an in-app address".into(),
                ));
            }
        };
        self.publisher.publish(
            topic,
            LiveEvent::Notification(Box::new(message.notification.clone())),
        );
        Ok(())
    }
}

/// Transport per channel
#[derive(Clone)]
pub struct TransportSet {
    pub email: Arc<dyn NotificationTransport>,
    pub sms: Arc<dyn NotificationTransport>,
    pub in_app: Arc<dyn NotificationTransport>,
}

impl TransportSet {
    /// Gateways from config; channels without a gateway URL only log.
    pub fn from_config(
        config: &Config,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, TransportError> {
        let gateway = |url: &Option<String>, channel| -> Result<Arc<dyn NotificationTransport>, TransportError> {
            Ok(match url {
                Some(url) => Arc::new(HttpGatewayTransport::new(url.clone())?),
                None => {
                    tracing::warn!(channel = %channel, "No gateway configured, notifications will only be logged");
                    Arc::new(LogTransport::new(channel))
                }
            })
        };

        Ok(Self {
            email: gateway(&config.email_gateway_url, NotificationChannel::Email)?,
            sms: gateway(&config.sms_gateway_url, NotificationChannel::Sms)?,
            in_app: Arc::new(InAppTransport::new(publisher)),
        })
    }

    /// Same transport behind every channel (tests)
    pub fn uniform(transport: Arc<dyn NotificationTransport>) -> Self {
        Self {
            email: transport.clone(),
            sms: transport.clone(),
            in_app: transport,
        }
    }

    pub fn for_channel(&self, channel: NotificationChannel) -> &Arc<dyn NotificationTransport> {
        match channel {
            NotificationChannel::Email => &self.email,
            NotificationChannel::Sms => &self.sms,
            NotificationChannel::InApp => &self.in_app,
        }
    }
}
