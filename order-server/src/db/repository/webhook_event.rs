//! Processed payment webhook events (idempotency ledger)

use super::RepoResult;
use sqlx::Sqlite;

/// Claim an event id. Returns `false` if the event was already processed.
pub async fn record_once(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    event_id: &str,
    event_type: &str,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at) \
         VALUES (?, ?, ?) ON CONFLICT(event_id) DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Release a claim so the provider's redelivery is processed again
pub async fn forget(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    event_id: &str,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM processed_webhook_events WHERE event_id = ?")
        .bind(event_id)
        .execute(conn)
        .await?;
    Ok(())
}
