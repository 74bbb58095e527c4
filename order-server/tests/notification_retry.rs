//! 通知分发与重试集成测试

mod common;

use common::*;
use order_server::notifications::{Address, DispatchError};
use shared::models::{
    NotificationChannel, NotificationSend, NotificationStatus, NotificationTarget,
};

fn send_to_waiter(channel: &str) -> NotificationSend {
    NotificationSend {
        user_id: Some(WAITER),
        customer_id: None,
        channel: channel.into(),
        title: "Shift swap".into(),
        body: "Ben covers the late shift".into(),
        order_id: None,
    }
}

async fn notification_rows(env: &TestEnv) -> i64 {
    count(&env.state, "SELECT COUNT(*) FROM notifications WHERE id > ?", 0).await
}

#[tokio::test]
async fn delivered_notification_is_sent_once() {
    let env = setup().await;
    let dispatcher = &env.state.notifications;

    let sent = dispatcher.send_for(&admin(), send_to_waiter("Email")).await.unwrap();
    assert_eq!(sent.status, NotificationStatus::Sent);
    assert_eq!(sent.retry_count, 0);
    assert!(sent.sent_at.is_some());
    assert_eq!(sent.target(), Some(NotificationTarget::User(WAITER)));

    let delivered = env.transport.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].address, Address::Email("ben@harbor.test".into()));

    let again = dispatcher.retry_for(&admin(), sent.id).await;
    assert!(matches!(again, Err(DispatchError::AlreadySent(id)) if id == sent.id));
    assert_eq!(env.transport.attempts(), 1);
}

#[tokio::test]
async fn three_failures_exhaust_retries() {
    let env = setup().await;
    let dispatcher = &env.state.notifications;
    env.transport.set_failing(true);
    assert_eq!(dispatcher.max_retries(), 3);

    let (notification_id, attempts) =
        match dispatcher.send_for(&waiter(), send_to_waiter("InApp")).await {
            Err(DispatchError::DeliveryFailed {
                notification_id,
                attempts,
                ..
            }) => (notification_id, attempts),
            other => panic!("expected delivery failure, got {other:?}"),
        };
    assert_eq!(attempts, 1);

    let pending = dispatcher.get(notification_id).await.unwrap();
    assert_eq!(pending.status, NotificationStatus::Pending);
    assert_eq!(pending.retry_count, 1);
    assert!(pending.last_error.as_deref().unwrap().contains("scripted outage"));

    for expected in [2, 3] {
        let retried = dispatcher.retry_for(&waiter(), notification_id).await;
        assert!(matches!(
            retried,
            Err(DispatchError::DeliveryFailed { attempts, .. }) if attempts == expected
        ));
    }

    let failed = dispatcher.get(notification_id).await.unwrap();
    assert_eq!(failed.status, NotificationStatus::Failed);
    assert_eq!(failed.retry_count, 3);
    assert!(failed.failed_at.is_some());
    assert!(failed.sent_at.is_none());

    // 已失败的通知不再投递
    env.transport.set_failing(false);
    let exhausted = dispatcher.retry_for(&waiter(), notification_id).await;
    assert!(matches!(
        exhausted,
        Err(DispatchError::RetryExhausted { attempts: 3, .. })
    ));
    assert_eq!(env.transport.attempts(), 3);
}

#[tokio::test]
async fn retry_recovers_after_transient_failure() {
    let env = setup().await;
    let dispatcher = &env.state.notifications;
    env.transport.set_failing(true);

    let Err(DispatchError::DeliveryFailed { notification_id, .. }) =
        dispatcher.send_for(&admin(), send_to_waiter("Sms")).await
    else {
        panic!("expected delivery failure");
    };

    env.transport.set_failing(false);
    let sent = dispatcher.retry_for(&admin(), notification_id).await.unwrap();
    assert_eq!(sent.status, NotificationStatus::Sent);
    assert_eq!(sent.retry_count, 1);
    assert_eq!(
        env.transport.delivered()[0].address,
        Address::Phone("+100101".into())
    );
}

#[tokio::test]
async fn unreachable_recipient_writes_nothing() {
    let env = setup().await;
    let dispatcher = &env.state.notifications;

    // Ada 没有手机号
    let mut payload = send_to_waiter("Sms");
    payload.user_id = Some(ADMIN);
    let result = dispatcher.send_for(&admin(), payload).await;
    assert!(matches!(result, Err(DispatchError::RecipientUnreachable { .. })));
    assert_eq!(notification_rows(&env).await, 0);
    assert_eq!(env.transport.attempts(), 0);
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let env = setup().await;
    let dispatcher = &env.state.notifications;

    let mut both = send_to_waiter("Email");
    both.customer_id = Some(GUEST);
    assert!(matches!(
        dispatcher.send_for(&admin(), both).await,
        Err(DispatchError::TargetInvalid)
    ));

    let mut neither = send_to_waiter("Email");
    neither.user_id = None;
    assert!(matches!(
        dispatcher.send_for(&admin(), neither).await,
        Err(DispatchError::TargetInvalid)
    ));

    assert!(matches!(
        dispatcher.send_for(&admin(), send_to_waiter("Fax")).await,
        Err(DispatchError::InvalidChannel(c)) if c == "Fax"
    ));

    assert!(matches!(
        dispatcher.retry_for(&admin(), 404).await,
        Err(DispatchError::NotFound(404))
    ));
    assert_eq!(notification_rows(&env).await, 0);
}

#[tokio::test]
async fn order_events_fan_out_per_recipient_and_channel() {
    let mut env = setup().await;
    let mut payload = takeaway(vec![item(NOODLES, 1)]);
    payload.branch_id = Some(HARBOR_MAIN);
    let order = env.state.orders.create(&guest(), payload).await.unwrap().order;

    let jobs = env.drain_jobs();
    assert_eq!(jobs.len(), 1);
    let worker = env.state.notification_worker();
    worker.process(jobs[0].clone()).await;

    // Ada, Ben: InApp + Email; Dana: InApp + Email + Sms
    let delivered = env.transport.delivered();
    assert_eq!(delivered.len(), 7);
    assert!(delivered.iter().all(|m| m.notification.order_id == Some(order.id)));
    assert!(!delivered.iter().any(|m| m.notification.user_id == Some(SUMMIT_WAITER)));
    let sms: Vec<_> = delivered
        .iter()
        .filter(|m| m.notification.channel == NotificationChannel::Sms)
        .collect();
    assert_eq!(sms.len(), 1);
    assert_eq!(sms[0].notification.customer_id, Some(GUEST));

    let sent: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE order_id = ? AND status = 'Sent'",
    )
    .bind(order.id)
    .fetch_one(&env.state.db.pool)
    .await
    .unwrap();
    assert_eq!(sent, 7);
}

#[tokio::test]
async fn failed_fan_out_leaves_order_untouched() {
    let mut env = setup().await;
    env.transport.set_failing(true);
    let order = env
        .state
        .orders
        .create(&waiter(), takeaway(vec![item(TEA, 1)]))
        .await
        .unwrap()
        .order;

    let worker = env.state.notification_worker();
    for job in env.drain_jobs() {
        worker.process(job).await;
    }

    let pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE order_id = ? AND status = 'Pending' AND retry_count = 1",
    )
    .bind(order.id)
    .fetch_one(&env.state.db.pool)
    .await
    .unwrap();
    // Ada, Ben: InApp + Email
    assert_eq!(pending, 4);

    let detail = env.state.orders.get(&waiter(), order.id).await.unwrap();
    assert_eq!(detail.order.status, shared::models::OrderStatus::Pending);
}
