//! Table & reservation allocator
//!
//! Every function runs on the caller's transaction. Exclusivity comes from
//! the conditional update in [`dining_table::try_occupy`]: only one writer can
//! flip a free table, so a second acquirer always sees zero affected rows.

use shared::error::{AppError, ErrorCode};
use sqlx::SqliteConnection;
use thiserror::Error;

use crate::db::repository::reservation::{self, NewReservation};
use crate::db::repository::{RepoError, dining_table};

#[derive(Debug, Error)]
pub enum AllocError {
    #[error("table {0} not found in branch")]
    TableNotFound(i64),
    #[error("table {0} is occupied")]
    TableOccupied(i64),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<AllocError> for AppError {
    fn from(err: AllocError) -> Self {
        match err {
            AllocError::TableNotFound(id) => {
                AppError::with_message(ErrorCode::TableNotFound, format!("Table {id} not found"))
                    .with_detail("table_id", id)
            }
            AllocError::TableOccupied(id) => {
                AppError::with_message(ErrorCode::TableOccupied, format!("Table {id} is occupied"))
                    .with_detail("table_id", id)
            }
            AllocError::Repo(e) => e.into(),
        }
    }
}

/// Hold a free table of `branch_id` for a new order.
pub async fn acquire(
    conn: &mut SqliteConnection,
    branch_id: i64,
    table_id: i64,
) -> Result<(), AllocError> {
    if dining_table::try_occupy(&mut *conn, branch_id, table_id).await? {
        tracing::debug!(table_id, branch_id, "Table acquired");
        return Ok(());
    }

    // CAS 失败：区分桌台不存在与已被占用
    match dining_table::find_by_id(&mut *conn, table_id).await? {
        Some(table) if table.branch_id == branch_id => Err(AllocError::TableOccupied(table_id)),
        _ => Err(AllocError::TableNotFound(table_id)),
    }
}

/// Free a table. Idempotent.
pub async fn release(conn: &mut SqliteConnection, table_id: i64) -> Result<(), AllocError> {
    dining_table::release(&mut *conn, table_id).await?;
    tracing::debug!(table_id, "Table released");
    Ok(())
}

/// Record a customer's claim on an acquired table for `minutes` from `now`.
pub async fn reserve(
    conn: &mut SqliteConnection,
    branch_id: i64,
    table_id: i64,
    order_id: i64,
    customer_id: i64,
    now: i64,
    minutes: i64,
) -> Result<i64, AllocError> {
    let id = reservation::insert(
        &mut *conn,
        &NewReservation {
            branch_id,
            table_id,
            order_id,
            customer_id,
            reserved_from: now,
            reserved_until: now + minutes * 60_000,
        },
    )
    .await?;
    Ok(id)
}

/// Drop the reservation attached to an order, if any.
pub async fn cancel_reservation(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> Result<bool, AllocError> {
    Ok(reservation::delete_by_order(&mut *conn, order_id).await?)
}
