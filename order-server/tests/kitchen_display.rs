//! 厨房看板集成测试

mod common;

use common::*;
use order_server::auth::GuardError;
use order_server::db::repository::kitchen_ticket;
use order_server::kitchen::KitchenError;
use shared::models::{TicketPriority, TicketStatus};
use shared::util::now_millis;

const MINUTE: i64 = 60_000;

async fn backdate_ticket(env: &TestEnv, order_id: i64, minutes: i64) {
    // 多留 30 秒，避免整分钟边界
    sqlx::query("UPDATE kitchen_tickets SET created_at = ? WHERE order_id = ?")
        .bind(now_millis() - minutes * MINUTE - 30_000)
        .bind(order_id)
        .execute(&env.state.db.pool)
        .await
        .unwrap();
}

async fn place(env: &TestEnv, payload: shared::models::OrderCreate) -> i64 {
    env.state.orders.create(&waiter(), payload).await.unwrap().order.id
}

#[tokio::test]
async fn board_orders_by_urgency_then_wait() {
    let env = setup().await;
    let fresh = place(&env, takeaway(vec![item(TEA, 1)])).await;
    let late = place(&env, dine_in(TABLE_ONE, vec![item(NOODLES, 2), item(TEA, 1)])).await;
    let slow = place(&env, takeaway(vec![item(NOODLES, 1)])).await;
    backdate_ticket(&env, fresh, 5).await;
    backdate_ticket(&env, late, 20).await;
    backdate_ticket(&env, slow, 12).await;

    let board = env.state.kitchen.list(&waiter(), HARBOR_MAIN).await.unwrap();
    let order_ids: Vec<i64> = board.iter().map(|v| v.order_id).collect();
    assert_eq!(order_ids, vec![late, slow, fresh]);

    assert_eq!(board[0].priority, TicketPriority::Urgent);
    assert_eq!(board[0].minutes_waiting, 20);
    assert_eq!(board[0].table_label, "Table 1");
    assert_eq!(board[0].items.len(), 2);
    assert_eq!(board[1].priority, TicketPriority::Warning);
    assert_eq!(board[1].table_label, "Takeaway");
    assert_eq!(board[2].priority, TicketPriority::Normal);
    assert_eq!(board[2].minutes_waiting, 5);
}

#[tokio::test]
async fn finished_tickets_leave_the_board() {
    let env = setup().await;
    let orders = &env.state.orders;
    let done = place(&env, takeaway(vec![item(TEA, 1)])).await;
    let open = place(&env, takeaway(vec![item(TEA, 1)])).await;
    for status in ["InProgress", "Ready", "Served"] {
        orders.update_status(&waiter(), done, status).await.unwrap();
    }

    let board = env.state.kitchen.list(&admin(), HARBOR_MAIN).await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].order_id, open);

    // 另一门店看板为空
    assert!(env.state.kitchen.list(&admin(), HARBOR_PIER).await.unwrap().is_empty());
}

#[tokio::test]
async fn ticket_bump_does_not_touch_order() {
    let env = setup().await;
    let id = place(&env, takeaway(vec![item(NOODLES, 1)])).await;
    let ticket_id = env
        .state
        .orders
        .get(&waiter(), id)
        .await
        .unwrap()
        .kitchen_ticket
        .unwrap()
        .id;

    let bumped = env
        .state
        .kitchen
        .update_ticket_status(&waiter(), ticket_id, "Preparing")
        .await
        .unwrap();
    assert_eq!(bumped.status, TicketStatus::Preparing);

    let detail = env.state.orders.get(&waiter(), id).await.unwrap();
    assert_eq!(detail.order.status, shared::models::OrderStatus::Pending);
    assert_eq!(detail.kitchen_ticket.unwrap().status, TicketStatus::Preparing);

    let board = env.state.kitchen.list(&waiter(), HARBOR_MAIN).await.unwrap();
    assert_eq!(board[0].status, TicketStatus::Preparing);

    let invalid = env
        .state
        .kitchen
        .update_ticket_status(&waiter(), ticket_id, "Plated")
        .await;
    assert!(matches!(invalid, Err(KitchenError::InvalidStatus(_))));
}

#[tokio::test]
async fn closed_tickets_cannot_be_reopened() {
    let env = setup().await;
    let cancelled = place(&env, takeaway(vec![item(TEA, 1)])).await;
    let served = place(&env, takeaway(vec![item(NOODLES, 1)])).await;
    let ticket_of = |detail: order_server::orders::OrderResult<shared::models::OrderDetail>| {
        detail.unwrap().kitchen_ticket.unwrap().id
    };
    let cancelled_ticket = ticket_of(env.state.orders.get(&waiter(), cancelled).await);
    let served_ticket = ticket_of(env.state.orders.get(&waiter(), served).await);

    env.state.orders.update_status(&waiter(), cancelled, "Cancelled").await.unwrap();
    for next in ["InProgress", "Ready", "Served"] {
        env.state.orders.update_status(&waiter(), served, next).await.unwrap();
    }

    for ticket_id in [cancelled_ticket, served_ticket] {
        let bump = env
            .state
            .kitchen
            .update_ticket_status(&waiter(), ticket_id, "Preparing")
            .await;
        assert!(matches!(bump, Err(KitchenError::Closed(t)) if t == ticket_id));
    }

    let board = env.state.kitchen.list(&waiter(), HARBOR_MAIN).await.unwrap();
    assert!(board.is_empty());
    let detail = env.state.orders.get(&waiter(), cancelled).await.unwrap();
    assert_eq!(detail.kitchen_ticket.unwrap().status, TicketStatus::Cancelled);
}

#[tokio::test]
async fn bump_targets_stay_in_flight() {
    let env = setup().await;
    let id = place(&env, takeaway(vec![item(TEA, 1)])).await;
    let ticket_id = env
        .state
        .orders
        .get(&waiter(), id)
        .await
        .unwrap()
        .kitchen_ticket
        .unwrap()
        .id;

    for terminal in ["Served", "Cancelled"] {
        let bump = env
            .state
            .kitchen
            .update_ticket_status(&waiter(), ticket_id, terminal)
            .await;
        assert!(matches!(bump, Err(KitchenError::InvalidStatus(s)) if s == terminal));
    }

    // 订单在读取之后才进入终态：条件更新不生效
    sqlx::query("UPDATE orders SET status = 'Cancelled' WHERE id = ?")
        .bind(id)
        .execute(&env.state.db.pool)
        .await
        .unwrap();
    let applied = kitchen_ticket::set_status(
        &env.state.db.pool,
        ticket_id,
        TicketStatus::Preparing,
        now_millis(),
    )
    .await
    .unwrap();
    assert!(!applied);
}

#[tokio::test]
async fn board_is_tenant_scoped() {
    let env = setup().await;
    let id = place(&env, takeaway(vec![item(TEA, 1)])).await;
    let ticket_id = env
        .state
        .orders
        .get(&waiter(), id)
        .await
        .unwrap()
        .kitchen_ticket
        .unwrap()
        .id;

    let foreign = env.state.kitchen.list(&summit_waiter(), HARBOR_MAIN).await;
    assert!(matches!(
        foreign,
        Err(KitchenError::Guard(GuardError::BranchNotFound(HARBOR_MAIN)))
    ));

    let customer = env.state.kitchen.list(&guest(), HARBOR_MAIN).await;
    assert!(matches!(customer, Err(KitchenError::Guard(GuardError::StaffRequired))));

    let bump = env
        .state
        .kitchen
        .update_ticket_status(&summit_waiter(), ticket_id, "Ready")
        .await;
    assert!(matches!(bump, Err(KitchenError::TicketNotFound(t)) if t == ticket_id));

    let missing = env.state.kitchen.list(&admin(), 999).await;
    assert!(matches!(missing, Err(KitchenError::Guard(GuardError::BranchNotFound(999)))));
}
