//! 订单生命周期集成测试

mod common;

use common::*;
use order_server::auth::GuardError;
use order_server::notifications::DispatchJob;
use order_server::orders::OrderError;
use order_server::tables::AllocError;
use shared::models::{
    DeliveryAddressInput, OrderChannel, OrderCreate, OrderListQuery, OrderStatus,
    PaymentRecordStatus, PaymentStatus, TicketStatus,
};

#[tokio::test]
async fn takeaway_order_merges_lines_and_prices_from_menu() {
    let mut env = setup().await;
    let orders = &env.state.orders;

    let detail = orders
        .create(
            &waiter(),
            takeaway(vec![item(NOODLES, 2), item(TEA, 1), item(NOODLES, 1)]),
        )
        .await
        .unwrap();

    assert_eq!(detail.order.channel, OrderChannel::Takeaway);
    assert_eq!(detail.order.branch_id, HARBOR_MAIN);
    assert_eq!(detail.order.restaurant_id, HARBOR);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(detail.order.created_by, Some(WAITER));
    // 3 x 9.25 + 3.50
    assert_eq!(detail.order.total_amount, 31.25);

    assert_eq!(detail.items.len(), 2);
    let noodles = detail.items.iter().find(|i| i.menu_item_id == NOODLES).unwrap();
    assert_eq!(noodles.quantity, 3);
    assert_eq!(noodles.unit_price, 9.25);
    assert_eq!(noodles.name, "Noodles");

    let ticket = detail.kitchen_ticket.expect("ticket created with order");
    assert_eq!(ticket.status, TicketStatus::Pending);
    assert_eq!(ticket.branch_id, HARBOR_MAIN);

    let payment = detail.payment.expect("payment stub created with order");
    assert_eq!(payment.status, PaymentRecordStatus::Pending);
    assert_eq!(payment.amount, 31.25);
    assert_eq!(payment.method, "cash");

    let jobs = env.drain_jobs();
    assert_eq!(jobs.len(), 1);
    assert!(matches!(&jobs[0], DispatchJob::OrderPlaced(o) if o.id == detail.order.id));
}

#[tokio::test]
async fn rejects_invalid_payloads_without_writing() {
    let env = setup().await;
    let orders = &env.state.orders;

    let empty = orders.create(&waiter(), takeaway(vec![])).await;
    assert!(matches!(empty, Err(OrderError::Empty)));

    let zero = orders.create(&waiter(), takeaway(vec![item(TEA, 0)])).await;
    assert!(matches!(
        zero,
        Err(OrderError::InvalidQuantity { menu_item_id: TEA, quantity: 0 })
    ));

    let channel = orders
        .create(
            &waiter(),
            OrderCreate {
                channel: "drive-thru".into(),
                items: vec![item(TEA, 1)],
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(channel, Err(OrderError::InvalidChannel(c)) if c == "drive-thru"));

    let sold_out = orders.create(&waiter(), takeaway(vec![item(SOLD_OUT, 1)])).await;
    assert!(matches!(sold_out, Err(OrderError::MenuItemUnavailable(SOLD_OUT))));

    // 其他餐厅的菜品视为不存在
    let foreign = orders.create(&waiter(), takeaway(vec![item(SUMMIT_SOUP, 1)])).await;
    assert!(matches!(foreign, Err(OrderError::MenuItemNotFound(SUMMIT_SOUP))));

    let no_table = orders
        .create(
            &waiter(),
            OrderCreate {
                channel: "dine-in".into(),
                items: vec![item(TEA, 1)],
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(no_table, Err(OrderError::TableRequired)));

    assert_eq!(count(&env.state, "SELECT COUNT(*) FROM orders WHERE id > ?", 0).await, 0);
}

#[tokio::test]
async fn status_walks_forward_and_ticket_follows() {
    let env = setup().await;
    let orders = &env.state.orders;
    let id = orders
        .create(&waiter(), takeaway(vec![item(NOODLES, 1)]))
        .await
        .unwrap()
        .order
        .id;

    for (next, ticket) in [
        ("InProgress", TicketStatus::InProgress),
        ("Ready", TicketStatus::Ready),
        ("Served", TicketStatus::Served),
    ] {
        let order = orders.update_status(&waiter(), id, next).await.unwrap();
        assert_eq!(order.status.as_str(), next);
        let detail = orders.get(&waiter(), id).await.unwrap();
        assert_eq!(detail.kitchen_ticket.unwrap().status, ticket);
    }

    let back = orders.update_status(&waiter(), id, "Ready").await;
    assert!(matches!(
        back,
        Err(OrderError::InvalidTransition {
            from: OrderStatus::Served,
            to: OrderStatus::Ready
        })
    ));

    let unknown = orders.update_status(&waiter(), id, "Preparing").await;
    assert!(matches!(unknown, Err(OrderError::InvalidStatus(_))));
}

#[tokio::test]
async fn pending_cannot_skip_to_served() {
    let env = setup().await;
    let orders = &env.state.orders;
    let id = orders
        .create(&waiter(), takeaway(vec![item(TEA, 1)]))
        .await
        .unwrap()
        .order
        .id;

    let skipped = orders.update_status(&waiter(), id, "Served").await;
    assert!(matches!(skipped, Err(OrderError::InvalidTransition { .. })));
    assert_eq!(
        orders.get(&waiter(), id).await.unwrap().order.status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn dine_in_holds_table_until_served() {
    let env = setup().await;
    let orders = &env.state.orders;

    let id = orders
        .create(&waiter(), dine_in(TABLE_ONE, vec![item(NOODLES, 2)]))
        .await
        .unwrap()
        .order
        .id;
    assert!(!table_is_free(&env.state, TABLE_ONE).await);

    let second = orders
        .create(&waiter(), dine_in(TABLE_ONE, vec![item(TEA, 1)]))
        .await;
    assert!(matches!(
        second,
        Err(OrderError::Table(AllocError::TableOccupied(TABLE_ONE)))
    ));

    // 其他门店的桌台
    let foreign = orders
        .create(&waiter(), dine_in(SUMMIT_TABLE, vec![item(TEA, 1)]))
        .await;
    assert!(matches!(
        foreign,
        Err(OrderError::Table(AllocError::TableNotFound(SUMMIT_TABLE)))
    ));

    orders.update_status(&waiter(), id, "InProgress").await.unwrap();
    orders.update_status(&waiter(), id, "Ready").await.unwrap();
    assert!(!table_is_free(&env.state, TABLE_ONE).await);
    orders.update_status(&waiter(), id, "Served").await.unwrap();
    assert!(table_is_free(&env.state, TABLE_ONE).await);
}

#[tokio::test]
async fn status_cancel_releases_table_and_keeps_order() {
    let env = setup().await;
    let orders = &env.state.orders;
    let id = orders
        .create(&waiter(), dine_in(TABLE_TWO, vec![item(TEA, 1)]))
        .await
        .unwrap()
        .order
        .id;
    orders.update_status(&waiter(), id, "InProgress").await.unwrap();

    let cancelled = orders.update_status(&waiter(), id, "Cancelled").await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(table_is_free(&env.state, TABLE_TWO).await);

    let detail = orders.get(&waiter(), id).await.unwrap();
    assert_eq!(detail.kitchen_ticket.unwrap().status, TicketStatus::Cancelled);

    // 已取消订单不能再改支付状态
    let paid = orders.update_payment_status(&waiter(), id, "Paid").await;
    assert!(matches!(paid, Err(OrderError::InvalidTransition { .. })));
}

#[tokio::test]
async fn payment_toggle_moves_order_and_ticket() {
    let mut env = setup().await;
    let orders = &env.state.orders;
    let id = orders
        .create(&waiter(), takeaway(vec![item(NOODLES, 1)]))
        .await
        .unwrap()
        .order
        .id;

    let paid = orders.update_payment_status(&waiter(), id, "Paid").await.unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::InProgress);
    let detail = orders.get(&waiter(), id).await.unwrap();
    assert_eq!(detail.kitchen_ticket.unwrap().status, TicketStatus::InProgress);
    let stub = detail.payment.unwrap();
    assert_eq!(stub.status, PaymentRecordStatus::Completed);
    assert!(stub.paid_at.is_some());

    let unpaid = orders.update_payment_status(&waiter(), id, "Unpaid").await.unwrap();
    assert_eq!(unpaid.payment_status, PaymentStatus::Unpaid);
    assert_eq!(unpaid.status, OrderStatus::Pending);

    let bogus = orders.update_payment_status(&waiter(), id, "Refunded").await;
    assert!(matches!(bogus, Err(OrderError::InvalidPaymentStatus(_))));

    let kinds: Vec<&str> = env.drain_jobs().iter().map(|j| j.kind()).collect();
    assert_eq!(kinds.len(), 3);
    assert_eq!(kinds[1], kinds[2]);
    assert_ne!(kinds[0], kinds[1]);
}

#[tokio::test]
async fn customers_cannot_drive_status_or_payment() {
    let env = setup().await;
    let orders = &env.state.orders;
    let mut payload = takeaway(vec![item(TEA, 2)]);
    payload.branch_id = Some(HARBOR_MAIN);
    let id = orders.create(&guest(), payload).await.unwrap().order.id;

    let status = orders.update_status(&guest(), id, "InProgress").await;
    assert!(matches!(status, Err(OrderError::Guard(GuardError::StaffRequired))));
    let payment = orders.update_payment_status(&guest(), id, "Paid").await;
    assert!(matches!(payment, Err(OrderError::Guard(GuardError::StaffRequired))));
}

#[tokio::test]
async fn cancel_removes_pending_aggregate() {
    let env = setup().await;
    let orders = &env.state.orders;
    let mut payload = dine_in(TABLE_ONE, vec![item(NOODLES, 1), item(TEA, 2)]);
    payload.branch_id = Some(HARBOR_MAIN);
    let id = orders.create(&guest(), payload).await.unwrap().order.id;

    assert!(!table_is_free(&env.state, TABLE_ONE).await);
    assert_eq!(
        count(&env.state, "SELECT COUNT(*) FROM reservations WHERE order_id = ?", id).await,
        1
    );

    orders.cancel(&guest(), id).await.unwrap();

    assert!(table_is_free(&env.state, TABLE_ONE).await);
    for sql in [
        "SELECT COUNT(*) FROM orders WHERE id = ?",
        "SELECT COUNT(*) FROM order_line_items WHERE order_id = ?",
        "SELECT COUNT(*) FROM kitchen_tickets WHERE order_id = ?",
        "SELECT COUNT(*) FROM payments WHERE order_id = ?",
        "SELECT COUNT(*) FROM reservations WHERE order_id = ?",
    ] {
        assert_eq!(count(&env.state, sql, id).await, 0, "{sql}");
    }
    assert!(matches!(
        orders.get(&guest(), id).await,
        Err(OrderError::NotFound(_))
    ));
}

#[tokio::test]
async fn only_pending_orders_can_be_cancelled() {
    let env = setup().await;
    let orders = &env.state.orders;
    let id = orders
        .create(&waiter(), takeaway(vec![item(TEA, 1)]))
        .await
        .unwrap()
        .order
        .id;
    orders.update_status(&waiter(), id, "InProgress").await.unwrap();

    let result = orders.cancel(&waiter(), id).await;
    assert!(matches!(
        result,
        Err(OrderError::NotCancellable { status: OrderStatus::InProgress, .. })
    ));
    assert_eq!(count(&env.state, "SELECT COUNT(*) FROM orders WHERE id = ?", id).await, 1);
}

#[tokio::test]
async fn delivery_with_inline_address() {
    let env = setup().await;
    let orders = &env.state.orders;
    let payload = OrderCreate {
        channel: "delivery".into(),
        items: vec![item(NOODLES, 1)],
        branch_id: Some(HARBOR_PIER),
        delivery_address: Some(DeliveryAddressInput {
            address: "12 Quay Street".into(),
            latitude: 51.5,
            longitude: -0.12,
        }),
        ..Default::default()
    };
    let detail = orders.create(&guest(), payload).await.unwrap();
    let location = detail.delivery_location.expect("inline address stored");
    assert_eq!(location.address, "12 Quay Street");
    assert_eq!(detail.order.delivery_location_id, Some(location.id));

    orders.cancel(&guest(), detail.order.id).await.unwrap();
    assert_eq!(
        count(&env.state, "SELECT COUNT(*) FROM delivery_locations WHERE id = ?", location.id).await,
        0
    );

    let missing = orders
        .create(
            &guest(),
            OrderCreate {
                channel: "delivery".into(),
                items: vec![item(NOODLES, 1)],
                branch_id: Some(HARBOR_PIER),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(missing, Err(OrderError::DeliveryLocationRequired)));
}

#[tokio::test]
async fn list_pages_newest_first() {
    let env = setup().await;
    let orders = &env.state.orders;
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(
            orders
                .create(&waiter(), takeaway(vec![item(TEA, 1)]))
                .await
                .unwrap()
                .order
                .id,
        );
    }
    orders.update_status(&waiter(), ids[0], "InProgress").await.unwrap();

    let page = orders
        .list(
            &waiter(),
            &OrderListQuery {
                per_page: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].id, ids[4]);

    let in_progress = orders
        .list(
            &waiter(),
            &OrderListQuery {
                status: Some("InProgress".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(in_progress.total, 1);
    assert_eq!(in_progress.data[0].id, ids[0]);
}

#[tokio::test]
async fn committed_order_is_announced_even_if_reload_fails() {
    let mut env = setup().await;
    // 插入后把状态改成无法解码的值，让提交后的重读失败
    sqlx::query(
        "CREATE TRIGGER garble_status AFTER INSERT ON orders BEGIN \
         UPDATE orders SET status = 'Lost' WHERE id = NEW.id; END",
    )
    .execute(&env.state.db.pool)
    .await
    .unwrap();
    let mut branch = env
        .state
        .live
        .subscribe(order_server::live::LiveTopic::Branch(HARBOR_MAIN));

    let detail = env
        .state
        .orders
        .create(&waiter(), takeaway(vec![item(TEA, 2)]))
        .await
        .unwrap();
    assert_eq!(detail.order.channel, OrderChannel::Takeaway);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.total_amount, 7.0);

    let stored = count(&env.state, "SELECT COUNT(*) FROM orders WHERE id = ?", detail.order.id).await;
    assert_eq!(stored, 1);
    assert!(matches!(
        branch.recv().await.unwrap(),
        order_server::live::LiveEvent::OrderCreated(o) if o.id == detail.order.id
    ));
    let jobs = env.drain_jobs();
    assert_eq!(jobs.len(), 1);
    assert!(matches!(&jobs[0], DispatchJob::OrderPlaced(o) if o.id == detail.order.id));
}
