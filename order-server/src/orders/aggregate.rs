//! Order aggregate unit of work
//!
//! Everything a new order writes (location, order row, merged lines, kitchen
//! ticket, payment stub, reservation) is collected into one value and
//! persisted on a single transaction. The caller owns the transaction and
//! decides when to commit.

use shared::models::{DeliveryAddressInput, Order, OrderChannel};
use sqlx::SqliteConnection;

use super::error::OrderResult;
use crate::db::repository::order::{NewLineItem, NewOrderRow};
use crate::db::repository::{delivery_location, kitchen_ticket, order, payment};
use crate::tables::allocator;

/// Default payment method when the request names none
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub customer_id: i64,
    pub minutes: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrderAggregate {
    pub order: NewOrderRow,
    pub items: Vec<NewLineItem>,
    pub payment_method: String,
    /// Inline address to store as an unsaved location
    pub inline_location: Option<DeliveryAddressInput>,
    /// Set for customer-initiated dine-in orders
    pub reservation: Option<ReservationRequest>,
}

impl NewOrderAggregate {
    /// Write the aggregate. A held table must already be acquired on `conn`.
    /// Returns the order as written.
    pub async fn persist(mut self, conn: &mut SqliteConnection, now: i64) -> OrderResult<Order> {
        if let Some(address) = &self.inline_location {
            let location_id =
                delivery_location::insert_unsaved(&mut *conn, self.order.customer_id, address)
                    .await?;
            self.order.delivery_location_id = Some(location_id);
        }

        let order_id = order::insert(&mut *conn, &self.order, now).await?;
        order::insert_line_items(&mut *conn, order_id, &self.items).await?;
        kitchen_ticket::insert(&mut *conn, order_id, self.order.branch_id, now).await?;
        payment::insert_pending(
            &mut *conn,
            order_id,
            &self.payment_method,
            self.order.total_amount,
        )
        .await?;

        if let (Some(reservation), Some(table_id), OrderChannel::DineIn) =
            (&self.reservation, self.order.table_id, self.order.channel)
        {
            allocator::reserve(
                &mut *conn,
                self.order.branch_id,
                table_id,
                order_id,
                reservation.customer_id,
                now,
                reservation.minutes,
            )
            .await?;
        }

        tracing::debug!(
            order_id,
            branch_id = self.order.branch_id,
            lines = self.items.len(),
            "Order aggregate persisted"
        );
        Ok(self.order.into_order(order_id, now))
    }
}
