//! Kitchen Ticket Repository

use super::RepoResult;
use shared::models::{KitchenTicket, OrderChannel, TicketStatus};
use sqlx::{QueryBuilder, Sqlite};

/// Board never shows more than this many tickets
pub const BOARD_LIMIT: i64 = 100;

/// Ticket joined with the order fields the board needs
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoardRow {
    pub ticket_id: i64,
    pub order_id: i64,
    pub status: TicketStatus,
    pub created_at: i64,
    pub channel: OrderChannel,
    pub table_number: Option<i32>,
}

/// Line item projected onto a ticket
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoardItemRow {
    pub order_id: i64,
    pub name: String,
    pub quantity: i32,
}

pub async fn insert(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
    branch_id: i64,
    now: i64,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO kitchen_tickets (order_id, branch_id, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(order_id)
    .bind(branch_id)
    .bind(TicketStatus::Pending)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<KitchenTicket>> {
    let ticket = sqlx::query_as::<_, KitchenTicket>(
        "SELECT id, order_id, branch_id, status, created_at, updated_at \
         FROM kitchen_tickets WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(ticket)
}

pub async fn find_by_order(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<Option<KitchenTicket>> {
    let ticket = sqlx::query_as::<_, KitchenTicket>(
        "SELECT id, order_id, branch_id, status, created_at, updated_at \
         FROM kitchen_tickets WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(ticket)
}

/// Mirror an order status change onto its ticket
pub async fn set_status_for_order(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
    status: TicketStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE kitchen_tickets SET status = ?, updated_at = ? WHERE order_id = ?")
        .bind(status)
        .bind(now)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Kitchen-side bump (e.g. InProgress -> Preparing); the order is untouched.
///
/// Only applies while the ticket is in flight and its order is not terminal;
/// returns false otherwise.
pub async fn set_status(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
    status: TicketStatus,
    now: i64,
) -> RepoResult<bool> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE kitchen_tickets SET status = ");
    qb.push_bind(status)
        .push(", updated_at = ")
        .push_bind(now)
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND status IN (");
    let mut sep = qb.separated(", ");
    for in_flight in TicketStatus::IN_FLIGHT {
        sep.push_bind(in_flight);
    }
    sep.push_unseparated(")");
    qb.push(
        " AND EXISTS (SELECT 1 FROM orders o WHERE o.id = kitchen_tickets.order_id \
         AND o.status NOT IN ('Served', 'Cancelled'))",
    );

    let rows = qb.build().execute(conn).await?;
    Ok(rows.rows_affected() == 1)
}

/// In-flight tickets for a branch, newest first, capped at [`BOARD_LIMIT`].
pub async fn board_rows(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    branch_id: i64,
) -> RepoResult<Vec<BoardRow>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT kt.id AS ticket_id, kt.order_id, kt.status, kt.created_at, o.channel, \
         dt.number AS table_number \
         FROM kitchen_tickets kt \
         JOIN orders o ON o.id = kt.order_id \
         LEFT JOIN dining_tables dt ON dt.id = o.table_id \
         WHERE kt.branch_id = ",
    );
    qb.push_bind(branch_id);
    qb.push(" AND kt.status IN (");
    let mut sep = qb.separated(", ");
    for status in TicketStatus::IN_FLIGHT {
        sep.push_bind(status);
    }
    sep.push_unseparated(")");
    qb.push(" ORDER BY kt.created_at DESC, kt.id DESC LIMIT ")
        .push_bind(BOARD_LIMIT);

    let rows = qb.build_query_as::<BoardRow>().fetch_all(conn).await?;
    Ok(rows)
}

/// Line items for a batch of orders
pub async fn board_items(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_ids: &[i64],
) -> RepoResult<Vec<BoardItemRow>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT order_id, name, quantity FROM order_line_items WHERE order_id IN (");
    let mut sep = qb.separated(", ");
    for id in order_ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");
    qb.push(" ORDER BY order_id, id");

    let rows = qb.build_query_as::<BoardItemRow>().fetch_all(conn).await?;
    Ok(rows)
}
