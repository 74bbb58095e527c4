//! 集成测试共用夹具
//!
//! Two restaurants on an in-memory database:
//!
//! ```text
//! restaurant 1 "Harbor"   branch 10 (tables 1, 2)   branch 11
//! restaurant 2 "Summit"   branch 20 (table 3)
//! ```
//!
//! Staff 100 is a Harbor admin, 101 works at branch 10, 200 at branch 20.
//! Customer 500 has email and phone, customer 501 has neither.

#![allow(dead_code)]

use async_trait::async_trait;
use order_server::auth::{Actor, AuthScope};
use order_server::core::{Config, ServerState};
use order_server::db::DbService;
use order_server::live::LiveHub;
use order_server::notifications::{
    DispatchJob, NotificationTransport, OutboundMessage, TransportError, TransportSet,
};
use shared::models::{OrderCreate, OrderItemInput};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const HARBOR: i64 = 1;
pub const SUMMIT: i64 = 2;
pub const HARBOR_MAIN: i64 = 10;
pub const HARBOR_PIER: i64 = 11;
pub const SUMMIT_MAIN: i64 = 20;

pub const NOODLES: i64 = 1;
pub const TEA: i64 = 2;
pub const SOLD_OUT: i64 = 3;
pub const SUMMIT_SOUP: i64 = 4;

pub const TABLE_ONE: i64 = 1;
pub const TABLE_TWO: i64 = 2;
pub const SUMMIT_TABLE: i64 = 3;

pub const ADMIN: i64 = 100;
pub const WAITER: i64 = 101;
pub const SUMMIT_WAITER: i64 = 200;
pub const GUEST: i64 = 500;
pub const SILENT_GUEST: i64 = 501;

/// Records every delivery; fails on demand
#[derive(Default)]
pub struct ScriptedTransport {
    fail: AtomicBool,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<OutboundMessage>>,
}

impl ScriptedTransport {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<OutboundMessage> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for ScriptedTransport {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("scripted outage".into()));
        }
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestEnv {
    pub state: ServerState,
    pub jobs: mpsc::Receiver<DispatchJob>,
    pub transport: Arc<ScriptedTransport>,
}

impl TestEnv {
    /// Pending fan-out jobs, without waiting
    pub fn drain_jobs(&mut self) -> Vec<DispatchJob> {
        let mut jobs = Vec::new();
        while let Ok(job) = self.jobs.try_recv() {
            jobs.push(job);
        }
        jobs
    }
}

pub async fn setup() -> TestEnv {
    let db = DbService::in_memory().await.expect("in-memory db");
    setup_on(db).await
}

pub async fn setup_on(db: DbService) -> TestEnv {
    seed(&db).await;
    let transport = Arc::new(ScriptedTransport::default());
    let (state, jobs) = ServerState::build(
        Config::for_tests(),
        db,
        LiveHub::new(),
        TransportSet::uniform(transport.clone()),
    );
    TestEnv {
        state,
        jobs,
        transport,
    }
}

async fn seed(db: &DbService) {
    let statements = [
        "INSERT INTO restaurants (id, name) VALUES (1, 'Harbor'), (2, 'Summit')",
        "INSERT INTO branches (id, restaurant_id, name) VALUES \
         (10, 1, 'Harbor Main'), (11, 1, 'Harbor Pier'), (20, 2, 'Summit Main')",
        "INSERT INTO staff_users (id, restaurant_id, branch_id, name, email, phone) VALUES \
         (100, 1, NULL, 'Ada', 'ada@harbor.test', NULL), \
         (101, 1, 10, 'Ben', 'ben@harbor.test', '+100101'), \
         (200, 2, 20, 'Cleo', 'cleo@summit.test', NULL)",
        "INSERT INTO customers (id, name, email, phone) VALUES \
         (500, 'Dana', 'dana@mail.test', '+100500'), (501, 'Eli', NULL, NULL)",
        "INSERT INTO menu_items (id, restaurant_id, name, price, is_available) VALUES \
         (1, 1, 'Noodles', 9.25, 1), (2, 1, 'Tea', 3.5, 1), \
         (3, 1, 'Crab', 42.0, 0), (4, 2, 'Soup', 7.0, 1)",
        "INSERT INTO dining_tables (id, branch_id, number, capacity, is_active) VALUES \
         (1, 10, 1, 4, 1), (2, 10, 2, 2, 1), (3, 20, 1, 4, 1)",
    ];
    for sql in statements {
        sqlx::query(sql).execute(&db.pool).await.expect("seed");
    }
}

// ========================================================================
// Actors
// ========================================================================

pub fn admin() -> Actor {
    Actor::staff(
        ADMIN,
        AuthScope::Restaurant {
            restaurant_id: HARBOR,
            branch_filter: None,
        },
    )
}

pub fn waiter() -> Actor {
    Actor::staff(WAITER, AuthScope::Branch { branch_id: HARBOR_MAIN })
}

pub fn summit_waiter() -> Actor {
    Actor::staff(SUMMIT_WAITER, AuthScope::Branch { branch_id: SUMMIT_MAIN })
}

pub fn guest() -> Actor {
    Actor::customer(GUEST)
}

// ========================================================================
// Payloads
// ========================================================================

pub fn item(menu_item_id: i64, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        menu_item_id,
        quantity,
    }
}

pub fn takeaway(items: Vec<OrderItemInput>) -> OrderCreate {
    OrderCreate {
        channel: "takeaway".into(),
        items,
        ..Default::default()
    }
}

pub fn dine_in(table_id: i64, items: Vec<OrderItemInput>) -> OrderCreate {
    OrderCreate {
        channel: "dine-in".into(),
        items,
        table_id: Some(table_id),
        ..Default::default()
    }
}

pub async fn table_is_free(state: &ServerState, table_id: i64) -> bool {
    let active: i64 = sqlx::query_scalar("SELECT is_active FROM dining_tables WHERE id = ?")
        .bind(table_id)
        .fetch_one(&state.db.pool)
        .await
        .expect("table row");
    active == 1
}

pub async fn count(state: &ServerState, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(&state.db.pool)
        .await
        .expect("count query")
}
