//! 实时推送集成测试

mod common;

use common::*;
use std::sync::Arc;

use order_server::live::{LiveEvent, LiveTopic};
use order_server::notifications::{NotificationDispatcher, TransportSet};
use shared::models::{NotificationSend, OrderStatus};

#[tokio::test]
async fn order_events_reach_branch_and_customer_topics() {
    let env = setup().await;
    let mut branch = env.state.live.subscribe(LiveTopic::Branch(HARBOR_MAIN));
    let mut customer = env.state.live.subscribe(LiveTopic::Customer(GUEST));
    let mut other_branch = env.state.live.subscribe(LiveTopic::Branch(HARBOR_PIER));

    let mut payload = takeaway(vec![item(TEA, 1)]);
    payload.branch_id = Some(HARBOR_MAIN);
    let id = env.state.orders.create(&guest(), payload).await.unwrap().order.id;
    env.state.orders.update_status(&waiter(), id, "InProgress").await.unwrap();

    assert!(matches!(branch.recv().await.unwrap(), LiveEvent::OrderCreated(o) if o.id == id));
    match branch.recv().await.unwrap() {
        LiveEvent::OrderStatusUpdated(o) => assert_eq!(o.status, OrderStatus::InProgress),
        other => panic!("unexpected branch event {other:?}"),
    }

    assert!(matches!(customer.recv().await.unwrap(), LiveEvent::OrderCreated(_)));
    assert!(matches!(
        customer.recv().await.unwrap(),
        LiveEvent::CustomerOrderStatusUpdated(o) if o.id == id
    ));

    assert!(other_branch.try_recv().is_err());
}

#[tokio::test]
async fn cancellation_announces_removal() {
    let env = setup().await;
    let id = env
        .state
        .orders
        .create(&waiter(), takeaway(vec![item(TEA, 1)]))
        .await
        .unwrap()
        .order
        .id;
    let mut branch = env.state.live.subscribe(LiveTopic::Branch(HARBOR_MAIN));

    env.state.orders.cancel(&waiter(), id).await.unwrap();
    assert!(matches!(
        branch.recv().await.unwrap(),
        LiveEvent::OrderRemoved { order_id } if order_id == id
    ));
}

#[tokio::test]
async fn in_app_notifications_are_pushed_to_the_user() {
    // 真实的 InApp 通道
    let env = setup().await;
    let live = env.state.live.clone();
    let transports = TransportSet::from_config(&env.state.config, Arc::new(live.clone())).unwrap();
    let dispatcher = NotificationDispatcher::new(env.state.db.pool.clone(), transports, 3);

    let mut inbox = live.subscribe(LiveTopic::User(WAITER));
    let sent = dispatcher
        .send_for(
            &admin(),
            NotificationSend {
                user_id: Some(WAITER),
                customer_id: None,
                channel: "InApp".into(),
                title: "Briefing".into(),
                body: "Team meeting at 3".into(),
                order_id: None,
            },
        )
        .await
        .unwrap();

    match inbox.recv().await.unwrap() {
        LiveEvent::Notification(n) => {
            assert_eq!(n.id, sent.id);
            assert_eq!(n.title, "Briefing");
        }
        other => panic!("unexpected event {other:?}"),
    }
}
