//! 服务器状态
//!
//! Every service is cheap to clone (pool handles and `Arc`s), so the whole
//! state is cloned into each axum handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::kitchen::KitchenService;
use crate::live::{EventPublisher, LiveHub};
use crate::notifications::{
    DispatchJob, NotificationDispatcher, NotificationQueue, NotificationWorker, TransportSet,
};
use crate::orders::OrderManager;
use crate::payments::PaymentWebhook;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt: Arc<JwtService>,
    pub live: LiveHub,
    pub orders: OrderManager,
    pub kitchen: KitchenService,
    pub notifications: NotificationDispatcher,
    pub webhook: PaymentWebhook,
}

impl ServerState {
    /// Open the database and wire every service from config.
    ///
    /// Returns the receiving end of the notification queue; hand it to
    /// [`ServerState::notification_worker`].
    pub async fn initialize(config: &Config) -> Result<(Self, mpsc::Receiver<DispatchJob>)> {
        let db = if config.database_url.contains(":memory:") {
            DbService::in_memory().await?
        } else {
            DbService::new(&config.database_url).await?
        };
        let live = LiveHub::new();
        let transports = TransportSet::from_config(config, Arc::new(live.clone()))?;
        Ok(Self::build(config.clone(), db, live, transports))
    }

    /// Wire services over an existing database and transports (tests inject
    /// scripted transports here).
    pub fn build(
        config: Config,
        db: DbService,
        live: LiveHub,
        transports: TransportSet,
    ) -> (Self, mpsc::Receiver<DispatchJob>) {
        let pool = db.pool.clone();
        let publisher: Arc<dyn EventPublisher> = Arc::new(live.clone());
        let (queue, rx) = NotificationQueue::channel(config.notify_queue_capacity);

        let orders = OrderManager::new(
            pool.clone(),
            publisher,
            queue,
            config.reservation_minutes,
        );
        let notifications =
            NotificationDispatcher::new(pool.clone(), transports, config.notify_max_retries);
        let webhook = PaymentWebhook::new(
            pool.clone(),
            orders.clone(),
            config.payment_webhook_secret.clone(),
            config.webhook_tolerance_secs,
        );

        let state = Self {
            jwt: Arc::new(JwtService::new(&config.jwt_secret)),
            kitchen: KitchenService::new(pool),
            config,
            db,
            live,
            orders,
            notifications,
            webhook,
        };
        (state, rx)
    }

    pub fn notification_worker(&self) -> NotificationWorker {
        NotificationWorker::new(
            self.notifications.clone(),
            self.db.pool.clone(),
            self.config.notify_concurrency,
        )
    }
}
