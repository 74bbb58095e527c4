//! Tenancy lookups: branches, staff and customer contacts
//!
//! These tables are maintained by the admin tooling; the order core only
//! reads them.

use super::RepoResult;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Branch {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
}

/// Reachable addresses of one recipient
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn find_branch(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    branch_id: i64,
) -> RepoResult<Option<Branch>> {
    let branch =
        sqlx::query_as::<_, Branch>("SELECT id, restaurant_id, name FROM branches WHERE id = ?")
            .bind(branch_id)
            .fetch_optional(conn)
            .await?;
    Ok(branch)
}

/// Staff who should hear about an order: everyone bound to the branch plus
/// restaurant-wide admins.
pub async fn staff_for_branch(
    pool: &SqlitePool,
    restaurant_id: i64,
    branch_id: i64,
) -> RepoResult<Vec<Contact>> {
    let staff = sqlx::query_as::<_, Contact>(
        "SELECT id, email, phone FROM staff_users \
         WHERE branch_id = ? OR (branch_id IS NULL AND restaurant_id = ?) \
         ORDER BY id",
    )
    .bind(branch_id)
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(staff)
}

pub async fn find_staff_contact(pool: &SqlitePool, user_id: i64) -> RepoResult<Option<Contact>> {
    let contact =
        sqlx::query_as::<_, Contact>("SELECT id, email, phone FROM staff_users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(contact)
}

pub async fn find_customer_contact(
    pool: &SqlitePool,
    customer_id: i64,
) -> RepoResult<Option<Contact>> {
    let contact =
        sqlx::query_as::<_, Contact>("SELECT id, email, phone FROM customers WHERE id = ?")
            .bind(customer_id)
            .fetch_optional(pool)
            .await?;
    Ok(contact)
}

/// Where a staff user is bound. Branch-bound rows inherit the restaurant of
/// their branch.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct StaffHome {
    pub id: i64,
    pub restaurant_id: Option<i64>,
    pub branch_id: Option<i64>,
}

pub async fn find_staff_home(pool: &SqlitePool, user_id: i64) -> RepoResult<Option<StaffHome>> {
    let home = sqlx::query_as::<_, StaffHome>(
        "SELECT s.id, COALESCE(s.restaurant_id, b.restaurant_id) AS restaurant_id, s.branch_id \
         FROM staff_users s LEFT JOIN branches b ON b.id = s.branch_id WHERE s.id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(home)
}
