//! Dining Table Repository

use super::RepoResult;
use shared::models::DiningTable;
use sqlx::Sqlite;

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(
        "SELECT id, branch_id, number, capacity, is_active FROM dining_tables WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(table)
}

/// Flip a free table to occupied. Returns `false` when the table is missing,
/// belongs to another branch, or is already held.
pub async fn try_occupy(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    branch_id: i64,
    table_id: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE dining_tables SET is_active = 0 WHERE id = ? AND branch_id = ? AND is_active = 1",
    )
    .bind(table_id)
    .bind(branch_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Mark a table free again. Releasing a free table is a no-op.
pub async fn release(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    table_id: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE dining_tables SET is_active = 1 WHERE id = ?")
        .bind(table_id)
        .execute(conn)
        .await?;
    Ok(())
}
