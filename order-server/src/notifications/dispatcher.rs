//! Notification Dispatcher
//!
//! Persists every notification before delivery and keeps the retry
//! bookkeeping on the row itself:
//!
//! ```text
//! send ──► insert Pending ──► transport.deliver
//!                                 ├─ ok  ──► Sent (sent_at)
//!                                 └─ err ──► retry_count += 1
//!                                             └─ reached max ──► Failed (failed_at)
//! ```
//!
//! There is no retry scheduler. A `Pending` notification that has failed can
//! be re-attempted explicitly through [`NotificationDispatcher::retry`].

use shared::models::{
    Notification, NotificationChannel, NotificationSend, NotificationStatus, NotificationTarget,
};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::error::{DispatchError, DispatchResult};
use super::transport::{Address, OutboundMessage, TransportSet};
use crate::auth::Actor;
use crate::db::repository::notification::{self, NewNotification};
use crate::db::repository::{order, tenancy};

#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: SqlitePool,
    transports: TransportSet,
    max_retries: i32,
}

impl NotificationDispatcher {
    pub fn new(pool: SqlitePool, transports: TransportSet, max_retries: i32) -> Self {
        Self {
            pool,
            transports,
            max_retries: max_retries.max(1),
        }
    }

    pub fn max_retries(&self) -> i32 {
        self.max_retries
    }

    /// Create and attempt one notification.
    ///
    /// The recipient is resolved first; a recipient without an address for
    /// the channel is rejected before any row is written.
    pub async fn send(&self, data: NewNotification) -> DispatchResult<Notification> {
        let address = self.resolve_address(data.target, data.channel).await?;
        self.send_to(data, address).await
    }

    /// Create and attempt one notification to an already resolved address
    pub(crate) async fn send_to(
        &self,
        data: NewNotification,
        address: Address,
    ) -> DispatchResult<Notification> {
        let created = notification::insert_pending(&self.pool, &data, now_millis()).await?;
        tracing::debug!(
            notification_id = created.id,
            channel = %created.channel,
            order_id = ?created.order_id,
            "Notification created"
        );
        self.attempt(created, address).await
    }

    /// Re-attempt a `Pending` notification that still has attempts left
    pub async fn retry(&self, id: i64) -> DispatchResult<Notification> {
        let current = self.get(id).await?;
        match current.status {
            NotificationStatus::Sent => return Err(DispatchError::AlreadySent(id)),
            NotificationStatus::Failed => {
                return Err(DispatchError::RetryExhausted {
                    id,
                    attempts: current.retry_count,
                });
            }
            NotificationStatus::Pending => {}
        }
        if current.retry_count >= self.max_retries {
            return Err(DispatchError::RetryExhausted {
                id,
                attempts: current.retry_count,
            });
        }

        let target = current.target().ok_or(DispatchError::TargetInvalid)?;
        tracing::info!(
            notification_id = id,
            retry_count = current.retry_count,
            "Retrying notification"
        );
        match self.resolve_address(target, current.channel).await {
            Ok(address) => self.attempt(current, address).await,
            // 地址缺失同样计为一次失败
            Err(err @ DispatchError::RecipientUnreachable { .. }) => {
                self.fail(id, &err.to_string()).await
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get(&self, id: i64) -> DispatchResult<Notification> {
        notification::find_by_id(&self.pool, id)
            .await?
            .ok_or(DispatchError::NotFound(id))
    }

    // ========================================================================
    // Actor-facing operations (staff only)
    // ========================================================================

    /// Explicit send on behalf of a staff member
    pub async fn send_for(
        &self,
        actor: &Actor,
        payload: NotificationSend,
    ) -> DispatchResult<Notification> {
        actor.require_staff()?;

        let target = match (payload.user_id, payload.customer_id) {
            (Some(user), None) => NotificationTarget::User(user),
            (None, Some(customer)) => NotificationTarget::Customer(customer),
            _ => return Err(DispatchError::TargetInvalid),
        };
        let channel: NotificationChannel = payload
            .channel
            .parse()
            .map_err(|_| DispatchError::InvalidChannel(payload.channel.clone()))?;

        if !self.visible_to(actor, payload.order_id, target).await? {
            return Err(match payload.order_id {
                Some(order_id) => DispatchError::OrderNotFound(order_id),
                None => DispatchError::OutOfScope,
            });
        }

        self.send(NewNotification {
            target,
            order_id: payload.order_id,
            channel,
            title: payload.title,
            body: payload.body,
        })
        .await
    }

    pub async fn get_for(&self, actor: &Actor, id: i64) -> DispatchResult<Notification> {
        actor.require_staff()?;
        let found = self.get(id).await?;
        let target = found.target().ok_or(DispatchError::NotFound(id))?;
        if self.visible_to(actor, found.order_id, target).await? {
            Ok(found)
        } else {
            Err(DispatchError::NotFound(id))
        }
    }

    pub async fn retry_for(&self, actor: &Actor, id: i64) -> DispatchResult<Notification> {
        self.get_for(actor, id).await?;
        self.retry(id).await
    }

    /// Order-linked notifications follow the order's visibility. Unlinked ones
    /// are only visible when they address staff inside the actor's scope.
    async fn visible_to(
        &self,
        actor: &Actor,
        order_id: Option<i64>,
        target: NotificationTarget,
    ) -> DispatchResult<bool> {
        if let Some(order_id) = order_id {
            let found = order::find_by_id(&self.pool, order_id).await?;
            return Ok(found.is_some_and(|o| actor.can_access_order(&o)));
        }
        match (actor, target) {
            (Actor::System, _) => Ok(true),
            (Actor::Staff { scope, .. }, NotificationTarget::User(user_id)) => {
                let home = tenancy::find_staff_home(&self.pool, user_id).await?;
                Ok(home.is_some_and(|h| scope.covers_staff(h.restaurant_id, h.branch_id)))
            }
            _ => Ok(false),
        }
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    async fn resolve_address(
        &self,
        target: NotificationTarget,
        channel: NotificationChannel,
    ) -> DispatchResult<Address> {
        let (contact, recipient) = match target {
            NotificationTarget::User(id) => (
                tenancy::find_staff_contact(&self.pool, id).await?,
                format!("user {id}"),
            ),
            NotificationTarget::Customer(id) => (
                tenancy::find_customer_contact(&self.pool, id).await?,
                format!("customer {id}"),
            ),
        };
        let unreachable = || DispatchError::RecipientUnreachable {
            recipient: recipient.clone(),
            channel: channel.to_string(),
        };
        let contact = contact.ok_or_else(unreachable)?;

        match channel {
            NotificationChannel::InApp => Ok(Address::InApp(target)),
            NotificationChannel::Email => contact.email.map(Address::Email).ok_or_else(unreachable),
            NotificationChannel::Sms => contact.phone.map(Address::Phone).ok_or_else(unreachable),
        }
    }

    async fn attempt(
        &self,
        current: Notification,
        address: Address,
    ) -> DispatchResult<Notification> {
        let id = current.id;
        let transport = self.transports.for_channel(current.channel).clone();
        let message = OutboundMessage {
            notification: current,
            address,
        };

        match transport.deliver(&message).await {
            Ok(()) => {
                if !notification::mark_sent(&self.pool, id, now_millis()).await? {
                    tracing::warn!(notification_id = id, "Notification left Pending during delivery");
                }
                tracing::info!(notification_id = id, "Notification sent");
                self.get(id).await
            }
            Err(e) => self.fail(id, &e.to_string()).await,
        }
    }

    /// Count one failed attempt and report it to the caller
    async fn fail(&self, id: i64, reason: &str) -> DispatchResult<Notification> {
        let outcome =
            notification::record_failure(&self.pool, id, reason, self.max_retries, now_millis())
                .await?;

        let Some(outcome) = outcome else {
            // 并发重试已改变状态
            let current = self.get(id).await?;
            return match current.status {
                NotificationStatus::Sent => Err(DispatchError::AlreadySent(id)),
                _ => Err(DispatchError::RetryExhausted {
                    id,
                    attempts: current.retry_count,
                }),
            };
        };

        if outcome.status == NotificationStatus::Failed {
            tracing::error!(
                notification_id = id,
                retry_count = outcome.retry_count,
                error = %reason,
                "Notification failed permanently"
            );
        } else {
            tracing::warn!(
                notification_id = id,
                retry_count = outcome.retry_count,
                error = %reason,
                "Notification delivery failed"
            );
        }

        Err(DispatchError::DeliveryFailed {
            notification_id: id,
            attempts: outcome.retry_count,
            reason: reason.to_string(),
        })
    }
}
