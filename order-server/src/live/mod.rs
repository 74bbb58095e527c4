//! LiveHub 实时事件分发
//!
//! Best-effort push of order and notification events to connected clients.
//! The kitchen board poll remains the source of truth; a client that misses
//! events (lag, reconnect) just waits for its next poll.
//!
//! ```text
//! OrderManager / InAppTransport
//!       │ publish(topic, LiveEvent)
//!       ▼
//! LiveHub
//!   └── topics: "branch:{id}" | "customer:{id}" | "user:{id}" → broadcast::Sender
//!         │
//!         ▼
//!   WS handler (subscribe → forward JSON)
//! ```

use dashmap::DashMap;
use serde::Serialize;
use shared::models::{Notification, Order};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel 容量
const TOPIC_CAPACITY: usize = 256;

/// Addressable event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveTopic {
    Branch(i64),
    Customer(i64),
    /// A single staff user (in-app notifications)
    User(i64),
}

impl fmt::Display for LiveTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(id) => write!(f, "branch:{id}"),
            Self::Customer(id) => write!(f, "customer:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// Event pushed to subscribers, serialized as `{"type": "...", "data": ...}`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum LiveEvent {
    OrderCreated(Box<Order>),
    OrderStatusUpdated(Box<Order>),
    CustomerOrderStatusUpdated(Box<Order>),
    OrderRemoved { order_id: i64 },
    Notification(Box<Notification>),
    /// Subscriber fell behind; client should refetch
    Resync,
}

/// Outbound side of the live channel, injected into the services
pub trait EventPublisher: Send + Sync {
    fn publish(&self, topic: LiveTopic, event: LiveEvent);
}

#[derive(Clone, Default)]
pub struct LiveHub {
    topics: Arc<DashMap<LiveTopic, broadcast::Sender<LiveEvent>>>,
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: LiveTopic) -> broadcast::Receiver<LiveEvent> {
        self.topics
            .entry(topic)
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Number of live subscribers on a topic
    pub fn subscriber_count(&self, topic: LiveTopic) -> usize {
        self.topics
            .get(&topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop topics nobody listens to any more
    pub fn prune(&self) {
        self.topics.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl EventPublisher for LiveHub {
    fn publish(&self, topic: LiveTopic, event: LiveEvent) {
        // 无订阅者时直接丢弃
        if let Some(tx) = self.topics.get(&topic) {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_keys() {
        assert_eq!(LiveTopic::Branch(3).to_string(), "branch:3");
        assert_eq!(LiveTopic::Customer(9).to_string(), "customer:9");
    }

    #[test]
    fn event_wire_format() {
        let json = serde_json::to_value(LiveEvent::OrderRemoved { order_id: 12 }).unwrap();
        assert_eq!(json["type"], "orderRemoved");
        assert_eq!(json["data"]["order_id"], 12);
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let hub = LiveHub::new();
        let mut branch_a = hub.subscribe(LiveTopic::Branch(1));
        let mut branch_b = hub.subscribe(LiveTopic::Branch(2));

        hub.publish(LiveTopic::Branch(1), LiveEvent::OrderRemoved { order_id: 5 });

        match branch_a.recv().await.unwrap() {
            LiveEvent::OrderRemoved { order_id } => assert_eq!(order_id, 5),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(branch_b.try_recv().is_err());
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let hub = LiveHub::new();
        hub.publish(LiveTopic::Customer(1), LiveEvent::Resync);
        assert_eq!(hub.subscriber_count(LiveTopic::Customer(1)), 0);
    }

    #[test]
    fn prune_removes_idle_topics() {
        let hub = LiveHub::new();
        let rx = hub.subscribe(LiveTopic::User(4));
        assert_eq!(hub.subscriber_count(LiveTopic::User(4)), 1);
        drop(rx);
        hub.prune();
        assert_eq!(hub.subscriber_count(LiveTopic::User(4)), 0);
        assert!(hub.topics.is_empty());
    }
}
