//! Delivery Location Repository

use super::RepoResult;
use shared::models::{DeliveryAddressInput, DeliveryLocation};
use sqlx::Sqlite;

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<DeliveryLocation>> {
    let location = sqlx::query_as::<_, DeliveryLocation>(
        "SELECT id, customer_id, address, latitude, longitude, is_saved \
         FROM delivery_locations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(location)
}

/// Store an address submitted inline with an order (not saved to the
/// customer's address book)
pub async fn insert_unsaved(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    customer_id: Option<i64>,
    input: &DeliveryAddressInput,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO delivery_locations (customer_id, address, latitude, longitude, is_saved) \
         VALUES (?, ?, ?, ?, 0) RETURNING id",
    )
    .bind(customer_id)
    .bind(&input.address)
    .bind(input.latitude)
    .bind(input.longitude)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Delete a location only if it was created inline; saved addresses survive.
pub async fn delete_unsaved(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM delivery_locations WHERE id = ? AND is_saved = 0")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}
