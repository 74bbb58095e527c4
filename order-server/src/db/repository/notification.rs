//! Notification Repository

use super::RepoResult;
use shared::models::{Notification, NotificationChannel, NotificationStatus, NotificationTarget};
use sqlx::Sqlite;

const NOTIFICATION_COLUMNS: &str = "id, user_id, customer_id, order_id, channel, title, body, \
     status, retry_count, last_error, sent_at, failed_at, created_at";

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub target: NotificationTarget,
    pub order_id: Option<i64>,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
}

pub async fn insert_pending(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    data: &NewNotification,
    now: i64,
) -> RepoResult<Notification> {
    let (user_id, customer_id) = match data.target {
        NotificationTarget::User(id) => (Some(id), None),
        NotificationTarget::Customer(id) => (None, Some(id)),
    };
    let row = sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (user_id, customer_id, order_id, channel, title, body, status, \
         retry_count, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?) RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(user_id)
    .bind(customer_id)
    .bind(data.order_id)
    .bind(data.channel)
    .bind(&data.title)
    .bind(&data.body)
    .bind(NotificationStatus::Pending)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Notification>> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Pending -> Sent. A row that already left Pending is left alone.
pub async fn mark_sent(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE notifications SET status = ?, sent_at = ?, last_error = NULL \
         WHERE id = ? AND status = ?",
    )
    .bind(NotificationStatus::Sent)
    .bind(now)
    .bind(id)
    .bind(NotificationStatus::Pending)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Outcome of recording one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct FailureOutcome {
    pub retry_count: i32,
    pub status: NotificationStatus,
}

/// Count one failed attempt in a single statement.
///
/// The counter increments atomically; the row flips to `Failed` on the attempt
/// that reaches `max_retries`. Returns `None` if the row is no longer Pending.
pub async fn record_failure(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
    error: &str,
    max_retries: i32,
    now: i64,
) -> RepoResult<Option<FailureOutcome>> {
    let outcome = sqlx::query_as::<_, FailureOutcome>(
        "UPDATE notifications SET \
             retry_count = retry_count + 1, \
             last_error = ?, \
             status = CASE WHEN retry_count + 1 >= ? THEN ? ELSE status END, \
             failed_at = CASE WHEN retry_count + 1 >= ? THEN ? ELSE failed_at END \
         WHERE id = ? AND status = ? \
         RETURNING retry_count, status",
    )
    .bind(error)
    .bind(max_retries)
    .bind(NotificationStatus::Failed)
    .bind(max_retries)
    .bind(now)
    .bind(id)
    .bind(NotificationStatus::Pending)
    .fetch_optional(conn)
    .await?;
    Ok(outcome)
}
