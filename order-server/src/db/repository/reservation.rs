//! Reservation Repository

use super::RepoResult;
use shared::models::Reservation;
use sqlx::Sqlite;

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub branch_id: i64,
    pub table_id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub reserved_from: i64,
    pub reserved_until: i64,
}

pub async fn insert(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    data: &NewReservation,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO reservations (branch_id, table_id, order_id, customer_id, reserved_from, reserved_until) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(data.branch_id)
    .bind(data.table_id)
    .bind(data.order_id)
    .bind(data.customer_id)
    .bind(data.reserved_from)
    .bind(data.reserved_until)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn find_by_order(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<Option<Reservation>> {
    let reservation = sqlx::query_as::<_, Reservation>(
        "SELECT id, branch_id, table_id, order_id, customer_id, reserved_from, reserved_until \
         FROM reservations WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(reservation)
}

pub async fn delete_by_order(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM reservations WHERE order_id = ?")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}
