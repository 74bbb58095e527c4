//! Payment Record Repository

use super::RepoResult;
use shared::models::{PaymentRecord, PaymentRecordStatus};
use sqlx::Sqlite;

pub async fn insert_pending(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
    method: &str,
    amount: f64,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO payments (order_id, method, status, amount) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(order_id)
    .bind(method)
    .bind(PaymentRecordStatus::Pending)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn find_by_order(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<Option<PaymentRecord>> {
    let record = sqlx::query_as::<_, PaymentRecord>(
        "SELECT id, order_id, method, status, amount, paid_at FROM payments WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Completed sets `paid_at`, pending clears it
pub async fn set_status(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: i64,
    status: PaymentRecordStatus,
    now: i64,
) -> RepoResult<bool> {
    let paid_at = match status {
        PaymentRecordStatus::Completed => Some(now),
        PaymentRecordStatus::Pending => None,
    };
    let rows = sqlx::query("UPDATE payments SET status = ?, paid_at = ? WHERE order_id = ?")
        .bind(status)
        .bind(paid_at)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}
