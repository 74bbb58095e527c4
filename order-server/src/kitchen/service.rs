use shared::error::{AppError, ErrorCode};
use shared::models::{KitchenTicket, KitchenTicketView, TicketStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;
use thiserror::Error;

use super::board::build_board;
use crate::auth::{Actor, GuardError};
use crate::db::repository::{RepoError, kitchen_ticket, order, tenancy};

#[derive(Debug, Error)]
pub enum KitchenError {
    #[error("kitchen ticket {0} not found")]
    TicketNotFound(i64),
    #[error("invalid ticket status '{0}'")]
    InvalidStatus(String),
    #[error("kitchen ticket {0} is closed")]
    Closed(i64),
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<KitchenError> for AppError {
    fn from(err: KitchenError) -> Self {
        let message = err.to_string();
        match err {
            KitchenError::TicketNotFound(id) => {
                AppError::with_message(ErrorCode::KitchenTicketNotFound, message)
                    .with_detail("ticket_id", id)
            }
            KitchenError::InvalidStatus(_) => {
                AppError::with_message(ErrorCode::InvalidTicketStatus, message)
            }
            KitchenError::Closed(id) => {
                AppError::with_message(ErrorCode::KitchenTicketClosed, message)
                    .with_detail("ticket_id", id)
            }
            KitchenError::Guard(e) => e.into(),
            KitchenError::Repo(e) => e.into(),
        }
    }
}

/// Read-only board plus the ticket bump. Holds no state between requests.
#[derive(Clone)]
pub struct KitchenService {
    pool: SqlitePool,
}

impl KitchenService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current board for a branch. Branches outside the actor's scope read
    /// as missing.
    pub async fn list(
        &self,
        actor: &Actor,
        branch_id: i64,
    ) -> Result<Vec<KitchenTicketView>, KitchenError> {
        actor.require_staff()?;
        tenancy::find_branch(&self.pool, branch_id)
            .await?
            .filter(|b| actor.can_access_branch(b.restaurant_id, b.id))
            .ok_or(GuardError::BranchNotFound(branch_id))?;

        let rows = kitchen_ticket::board_rows(&self.pool, branch_id).await?;
        let order_ids: Vec<i64> = rows.iter().map(|r| r.order_id).collect();
        let items = kitchen_ticket::board_items(&self.pool, &order_ids).await?;
        Ok(build_board(rows, items, now_millis()))
    }

    /// Kitchen-side status bump; the order itself is not touched
    pub async fn update_ticket_status(
        &self,
        actor: &Actor,
        ticket_id: i64,
        status: &str,
    ) -> Result<KitchenTicket, KitchenError> {
        actor.require_staff()?;
        let next: TicketStatus = status
            .parse()
            .map_err(|_| KitchenError::InvalidStatus(status.to_string()))?;

        // 终态由订单驱动，厨房只能在进行中的状态之间切换
        if !next.is_in_flight() {
            return Err(KitchenError::InvalidStatus(status.to_string()));
        }

        let ticket = kitchen_ticket::find_by_id(&self.pool, ticket_id)
            .await?
            .ok_or(KitchenError::TicketNotFound(ticket_id))?;
        let Some(owner) = order::find_by_id(&self.pool, ticket.order_id)
            .await?
            .filter(|o| actor.can_access_order(o))
        else {
            return Err(KitchenError::TicketNotFound(ticket_id));
        };
        if owner.status.is_terminal() || !ticket.status.is_in_flight() {
            return Err(KitchenError::Closed(ticket_id));
        }

        if !kitchen_ticket::set_status(&self.pool, ticket_id, next, now_millis()).await? {
            // 并发下订单刚进入终态
            return Err(KitchenError::Closed(ticket_id));
        }
        tracing::info!(
            ticket_id,
            order_id = ticket.order_id,
            from = ticket.status.as_str(),
            to = next.as_str(),
            "Kitchen ticket bumped"
        );

        kitchen_ticket::find_by_id(&self.pool, ticket_id)
            .await?
            .ok_or(KitchenError::TicketNotFound(ticket_id))
    }
}
