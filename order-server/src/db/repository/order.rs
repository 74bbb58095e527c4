//! Order Repository
//!
//! Order rows and their line items. The aggregate insert itself lives in
//! `orders::aggregate`, which drives these functions inside one transaction.

use super::RepoResult;
use shared::models::{Order, OrderChannel, OrderLineItem, OrderStatus, PaymentStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "id, restaurant_id, branch_id, customer_id, created_by, channel, status, \
     payment_status, total_amount, table_id, delivery_location_id, notes, created_at, updated_at";

/// Row values for a new order (status starts at Pending / Unpaid)
#[derive(Debug, Clone)]
pub struct NewOrderRow {
    pub restaurant_id: i64,
    pub branch_id: i64,
    pub customer_id: Option<i64>,
    pub created_by: Option<i64>,
    pub channel: OrderChannel,
    pub total_amount: f64,
    pub table_id: Option<i64>,
    pub delivery_location_id: Option<i64>,
    pub notes: Option<String>,
}

impl NewOrderRow {
    /// The row as it reads back right after the insert
    pub fn into_order(self, id: i64, now: i64) -> Order {
        Order {
            id,
            restaurant_id: self.restaurant_id,
            branch_id: self.branch_id,
            customer_id: self.customer_id,
            created_by: self.created_by,
            channel: self.channel,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            total_amount: self.total_amount,
            table_id: self.table_id,
            delivery_location_id: self.delivery_location_id,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One merged line with its price snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
}

/// Listing filter; `None` fields are unconstrained
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub restaurant_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn insert(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    row: &NewOrderRow,
    now: i64,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders (restaurant_id, branch_id, customer_id, created_by, channel, status, \
         payment_status, total_amount, table_id, delivery_location_id, notes, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(row.restaurant_id)
    .bind(row.branch_id)
    .bind(row.customer_id)
    .bind(row.created_by)
    .bind(row.channel)
    .bind(OrderStatus::Pending)
    .bind(PaymentStatus::Unpaid)
    .bind(row.total_amount)
    .bind(row.table_id)
    .bind(row.delivery_location_id)
    .bind(&row.notes)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_line_items(
    conn: &mut SqliteConnection,
    order_id: i64,
    items: &[NewLineItem],
) -> RepoResult<()> {
    for item in items {
        sqlx::query(
            "INSERT INTO order_line_items (order_id, menu_item_id, name, quantity, unit_price) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(item.menu_item_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn find_line_items(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<Vec<OrderLineItem>> {
    let items = sqlx::query_as::<_, OrderLineItem>(
        "SELECT id, order_id, menu_item_id, name, quantity, unit_price \
         FROM order_line_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Compare-and-set the order status. Returns `false` if the order is gone or
/// its status moved on since it was read.
pub async fn transition_status(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
    expected: OrderStatus,
    next: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(next)
    .bind(now)
    .bind(id)
    .bind(expected)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Payment toggle: rewrite both status columns in one statement.
/// Cancelled orders are never touched.
pub async fn set_payment_state(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
    status: OrderStatus,
    payment_status: PaymentStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = ?, payment_status = ?, updated_at = ? \
         WHERE id = ? AND status <> ?",
    )
    .bind(status)
    .bind(payment_status)
    .bind(now)
    .bind(id)
    .bind(OrderStatus::Cancelled)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Hard delete of a pending order with its lines, ticket and payment stub.
///
/// Returns `false` when the order is gone or no longer Pending; the caller
/// must then roll back.
pub async fn delete_pending(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    for sql in [
        "DELETE FROM order_line_items WHERE order_id = ?",
        "DELETE FROM kitchen_tickets WHERE order_id = ?",
        "DELETE FROM payments WHERE order_id = ?",
    ] {
        sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    }
    let rows = sqlx::query("DELETE FROM orders WHERE id = ? AND status = ?")
        .bind(id)
        .bind(OrderStatus::Pending)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() == 1)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(restaurant_id) = filter.restaurant_id {
        qb.push(" AND restaurant_id = ").push_bind(restaurant_id);
    }
    if let Some(branch_id) = filter.branch_id {
        qb.push(" AND branch_id = ").push_bind(branch_id);
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

/// Paginated listing, newest first. Returns the page and the total count.
pub async fn list(
    pool: &SqlitePool,
    filter: &OrderFilter,
    limit: u32,
    offset: u64,
) -> RepoResult<(Vec<Order>, u64)> {
    let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit as i64)
        .push(" OFFSET ")
        .push_bind(offset as i64);

    let orders = qb.build_query_as::<Order>().fetch_all(pool).await?;
    Ok((orders, total.max(0) as u64))
}
