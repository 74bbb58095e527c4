//! Notification Worker - 订单通知后台分发
//!
//! Order operations enqueue a [`DispatchJob`] after commit. The worker fans
//! each job out into one notification per recipient and channel and sends
//! them concurrently, bounded by a semaphore. Failures stay on the
//! notification rows; nothing is reported back to the order.

use futures::future::join_all;
use shared::models::{NotificationChannel, NotificationTarget, Order};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::dispatcher::NotificationDispatcher;
use super::transport::Address;
use crate::db::repository::notification::NewNotification;
use crate::db::repository::tenancy::{self, Contact};

/// Order event that should reach people
#[derive(Debug, Clone)]
pub enum DispatchJob {
    OrderPlaced(Order),
    StatusChanged(Order),
    PaymentUpdated(Order),
}

impl DispatchJob {
    pub fn order(&self) -> &Order {
        match self {
            Self::OrderPlaced(o) | Self::StatusChanged(o) | Self::PaymentUpdated(o) => o,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderPlaced(_) => "order_placed",
            Self::StatusChanged(_) => "status_changed",
            Self::PaymentUpdated(_) => "payment_updated",
        }
    }

    fn title(&self) -> String {
        let order = self.order();
        match self {
            Self::OrderPlaced(_) => format!("New order #{}", order.id),
            Self::StatusChanged(_) => format!("Order #{} is {}", order.id, order.status),
            Self::PaymentUpdated(_) => {
                format!("Order #{} payment {}", order.id, order.payment_status.as_str())
            }
        }
    }

    fn body(&self) -> String {
        let order = self.order();
        match self {
            Self::OrderPlaced(_) => format!(
                "{} order placed, total {:.2}",
                order.channel, order.total_amount
            ),
            Self::StatusChanged(_) => format!("Status changed to {}", order.status),
            Self::PaymentUpdated(_) => format!(
                "Payment marked {} for {:.2}",
                order.payment_status.as_str(),
                order.total_amount
            ),
        }
    }
}

/// Producer side handed to the order manager
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<DispatchJob>,
}

impl NotificationQueue {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DispatchJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Never blocks the caller; a full or closed queue drops the job.
    pub fn enqueue(&self, job: DispatchJob) {
        let order_id = job.order().id;
        let kind = job.kind();
        match self.tx.try_send(job) {
            Ok(()) => tracing::debug!(order_id, kind, "Dispatch job queued"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(order_id, kind, "Notification queue full, job dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(order_id, kind, "Notification queue closed, job dropped");
            }
        }
    }
}

pub struct NotificationWorker {
    dispatcher: NotificationDispatcher,
    pool: SqlitePool,
    semaphore: Arc<Semaphore>,
}

impl NotificationWorker {
    pub fn new(dispatcher: NotificationDispatcher, pool: SqlitePool, concurrency: usize) -> Self {
        Self {
            dispatcher,
            pool,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Drain jobs until the queue closes or `shutdown` fires. On shutdown the
    /// queue is closed and jobs already accepted are still processed.
    pub async fn run(self, mut rx: mpsc::Receiver<DispatchJob>, shutdown: CancellationToken) {
        tracing::info!(
            concurrency = self.semaphore.available_permits(),
            "NotificationWorker started"
        );
        let worker = Arc::new(self);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                job = rx.recv() => match job {
                    Some(job) => worker.spawn_job(&mut in_flight, job).await,
                    None => {
                        tracing::info!("Notification queue closed");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    rx.close();
                    let mut drained = 0usize;
                    while let Some(job) = rx.recv().await {
                        worker.spawn_job(&mut in_flight, job).await;
                        drained += 1;
                    }
                    tracing::info!(drained, "NotificationWorker draining on shutdown");
                    break;
                }
            }
            // 回收已完成的任务
            while in_flight.try_join_next().is_some() {}
        }

        while let Some(res) = in_flight.join_next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "Dispatch job task failed");
            }
        }
        tracing::info!("NotificationWorker stopped");
    }

    async fn spawn_job(self: &Arc<Self>, in_flight: &mut JoinSet<()>, job: DispatchJob) {
        let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
            return;
        };
        let worker = self.clone();
        in_flight.spawn(async move {
            worker.process(job).await;
            drop(permit);
        });
    }

    /// Fan one job out to every interested recipient
    pub async fn process(&self, job: DispatchJob) {
        let order = job.order();
        let messages = match self.recipients(order).await {
            Ok(recipients) => fan_out(&job, &recipients),
            Err(e) => {
                tracing::error!(order_id = order.id, error = %e, "Failed to resolve notification recipients");
                return;
            }
        };
        if messages.is_empty() {
            return;
        }

        let results = join_all(
            messages
                .into_iter()
                .map(|(data, address)| self.dispatcher.send_to(data, address)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        for err in results.into_iter().filter_map(Result::err) {
            tracing::warn!(order_id = order.id, kind = job.kind(), error = %err, "Notification not delivered");
        }
        tracing::debug!(
            order_id = order.id,
            kind = job.kind(),
            failed,
            "Dispatch job processed"
        );
    }

    async fn recipients(&self, order: &Order) -> crate::db::repository::RepoResult<Recipients> {
        let staff = tenancy::staff_for_branch(&self.pool, order.restaurant_id, order.branch_id).await?;
        let customer = match order.customer_id {
            Some(id) => tenancy::find_customer_contact(&self.pool, id).await?,
            None => None,
        };
        Ok(Recipients { staff, customer })
    }
}

#[derive(Debug, Default)]
struct Recipients {
    staff: Vec<Contact>,
    customer: Option<Contact>,
}

/// Staff get InApp plus Email when they have one; the customer gets InApp
/// plus Email and Sms for each address on file.
fn fan_out(job: &DispatchJob, recipients: &Recipients) -> Vec<(NewNotification, Address)> {
    let order_id = job.order().id;
    let title = job.title();
    let body = job.body();
    let make = |target, channel| NewNotification {
        target,
        order_id: Some(order_id),
        channel,
        title: title.clone(),
        body: body.clone(),
    };

    let mut out = Vec::new();
    for staff in &recipients.staff {
        let target = NotificationTarget::User(staff.id);
        out.push((make(target, NotificationChannel::InApp), Address::InApp(target)));
        if let Some(email) = &staff.email {
            out.push((make(target, NotificationChannel::Email), Address::Email(email.clone())));
        }
    }
    if let Some(customer) = &recipients.customer {
        let target = NotificationTarget::Customer(customer.id);
        out.push((make(target, NotificationChannel::InApp), Address::InApp(target)));
        if let Some(email) = &customer.email {
            out.push((make(target, NotificationChannel::Email), Address::Email(email.clone())));
        }
        if let Some(phone) = &customer.phone {
            out.push((make(target, NotificationChannel::Sms), Address::Phone(phone.clone())));
        }
    }
    out
}
