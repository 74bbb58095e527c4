//! OrderManager - 订单生命周期
//!
//! Every mutating call runs as one SQLite transaction whose first statement
//! is a write, so the write lock is taken up front and concurrent writers
//! queue on the busy timeout instead of failing mid-way. Menu prices and
//! delivery locations are read before the transaction opens.
//!
//! Live events and notification jobs are emitted only after commit and never
//! fail the call.

use shared::models::{
    DeliveryAddressInput, Order, OrderChannel, OrderCreate, OrderDetail, OrderListQuery,
    OrderStatus, Page, PaymentRecordStatus, PaymentStatus, TicketStatus,
};
use shared::util::now_millis;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

use super::aggregate::{DEFAULT_PAYMENT_METHOD, NewOrderAggregate, ReservationRequest};
use super::error::{OrderError, OrderResult};
use super::merge::merge_items;
use super::money;
use super::status::{check_transition, releases_table};
use crate::auth::{Actor, BranchChoice, GuardError};
use crate::db::repository::order::{NewLineItem, NewOrderRow, OrderFilter};
use crate::db::repository::{
    delivery_location, kitchen_ticket, menu, order, payment, tenancy,
};
use crate::live::{EventPublisher, LiveEvent, LiveTopic};
use crate::notifications::{DispatchJob, NotificationQueue};
use crate::tables::allocator;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Delivery location chosen for a new order
enum LocationChoice {
    Saved(i64),
    Inline(DeliveryAddressInput),
}

#[derive(Clone)]
pub struct OrderManager {
    pool: SqlitePool,
    publisher: Arc<dyn EventPublisher>,
    queue: NotificationQueue,
    reservation_minutes: i64,
}

impl OrderManager {
    pub fn new(
        pool: SqlitePool,
        publisher: Arc<dyn EventPublisher>,
        queue: NotificationQueue,
        reservation_minutes: i64,
    ) -> Self {
        Self {
            pool,
            publisher,
            queue,
            reservation_minutes,
        }
    }

    // ========================================================================
    // Create
    // ========================================================================

    pub async fn create(&self, actor: &Actor, payload: OrderCreate) -> OrderResult<OrderDetail> {
        let channel: OrderChannel = payload
            .channel
            .parse()
            .map_err(|_| OrderError::InvalidChannel(payload.channel.clone()))?;
        let merged = merge_items(&payload.items)?;

        let (restaurant_id, branch_id) = self.resolve_branch(actor, payload.branch_id).await?;
        let customer_id = actor.customer_id();

        let (table_id, location) = match channel {
            OrderChannel::DineIn => (Some(payload.table_id.ok_or(OrderError::TableRequired)?), None),
            OrderChannel::Delivery => (None, Some(self.resolve_location(actor, &payload).await?)),
            OrderChannel::Takeaway => (None, None),
        };

        let items = self.price_items(restaurant_id, &merged).await?;
        let total_amount = money::order_total(&items);

        let (delivery_location_id, inline_location) = match location {
            Some(LocationChoice::Saved(id)) => (Some(id), None),
            Some(LocationChoice::Inline(address)) => (None, Some(address)),
            None => (None, None),
        };
        let reservation = match (channel, customer_id) {
            (OrderChannel::DineIn, Some(customer_id)) => Some(ReservationRequest {
                customer_id,
                minutes: self.reservation_minutes,
            }),
            _ => None,
        };

        let aggregate = NewOrderAggregate {
            order: NewOrderRow {
                restaurant_id,
                branch_id,
                customer_id,
                created_by: actor.staff_user_id(),
                channel,
                total_amount,
                table_id,
                delivery_location_id,
                notes: payload.notes.filter(|n| !n.trim().is_empty()),
            },
            items,
            payment_method: payload
                .payment_method
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            inline_location,
            reservation,
        };

        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        if let Some(table_id) = table_id {
            allocator::acquire(&mut tx, branch_id, table_id).await?;
        }
        let created = aggregate.persist(&mut tx, now).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = created.id,
            branch_id,
            channel = %channel,
            total = total_amount,
            "Order created"
        );

        self.publish(&created, |o| LiveEvent::OrderCreated(Box::new(o.clone())), |o| {
            LiveEvent::OrderCreated(Box::new(o.clone()))
        });
        self.queue.enqueue(DispatchJob::OrderPlaced(created.clone()));

        // 已提交：重读失败只记录，不把成功的下单报成失败
        match self.load_detail(created.id).await {
            Ok(detail) => Ok(detail),
            Err(err) => {
                tracing::error!(order_id = created.id, error = %err, "Order committed but detail reload failed");
                Ok(OrderDetail::from(created))
            }
        }
    }

    /// Owning branch for a new order, checked against the actor's scope
    async fn resolve_branch(
        &self,
        actor: &Actor,
        requested: Option<i64>,
    ) -> OrderResult<(i64, i64)> {
        let (branch_id, expected_restaurant) = match actor.choose_branch(requested)? {
            BranchChoice::Fixed(id) | BranchChoice::Any(id) => (id, None),
            BranchChoice::Verify {
                branch_id,
                restaurant_id,
            } => (branch_id, Some(restaurant_id)),
        };

        let branch = tenancy::find_branch(&self.pool, branch_id)
            .await?
            .filter(|b| expected_restaurant.is_none_or(|r| r == b.restaurant_id))
            .ok_or(GuardError::BranchNotFound(branch_id))?;
        Ok((branch.restaurant_id, branch.id))
    }

    async fn resolve_location(
        &self,
        actor: &Actor,
        payload: &OrderCreate,
    ) -> OrderResult<LocationChoice> {
        if let Some(id) = payload.delivery_location_id {
            let location = delivery_location::find_by_id(&self.pool, id)
                .await?
                // 顾客只能使用自己的地址
                .filter(|l| actor.customer_id().is_none_or(|c| l.customer_id == Some(c)))
                .ok_or(OrderError::DeliveryLocationNotFound(id))?;
            return Ok(LocationChoice::Saved(location.id));
        }

        let address = payload
            .delivery_address
            .clone()
            .ok_or(OrderError::DeliveryLocationRequired)?;
        validate_address(&address)?;
        Ok(LocationChoice::Inline(address))
    }

    /// Snapshot current menu prices for the merged lines
    async fn price_items(
        &self,
        restaurant_id: i64,
        merged: &[(i64, i32)],
    ) -> OrderResult<Vec<NewLineItem>> {
        let ids: Vec<i64> = merged.iter().map(|(id, _)| *id).collect();
        let menu: HashMap<i64, menu::MenuItemPrice> =
            menu::find_for_restaurant(&self.pool, restaurant_id, &ids)
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect();

        merged
            .iter()
            .map(|&(menu_item_id, quantity)| {
                let item = menu
                    .get(&menu_item_id)
                    .ok_or(OrderError::MenuItemNotFound(menu_item_id))?;
                if !item.is_available {
                    return Err(OrderError::MenuItemUnavailable(menu_item_id));
                }
                Ok(NewLineItem {
                    menu_item_id,
                    name: item.name.clone(),
                    quantity,
                    unit_price: item.price,
                })
            })
            .collect()
    }

    // ========================================================================
    // Read
    // ========================================================================

    pub async fn get(&self, actor: &Actor, id: i64) -> OrderResult<OrderDetail> {
        self.load_visible(actor, id).await?;
        self.load_detail(id).await
    }

    pub async fn list(&self, actor: &Actor, query: &OrderListQuery) -> OrderResult<Page<Order>> {
        let tenant = actor.list_filter(query.branch_id)?;
        let status = query
            .status
            .as_deref()
            .map(|s| s.parse::<OrderStatus>().map_err(|_| OrderError::InvalidStatus(s.to_string())))
            .transpose()?;

        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let page = query.page.unwrap_or(1).max(1);
        let offset = u64::from(page - 1) * u64::from(per_page);

        let filter = OrderFilter {
            restaurant_id: tenant.restaurant_id,
            branch_id: tenant.branch_id,
            customer_id: tenant.customer_id,
            status,
            from: query.from,
            to: query.to,
        };
        let (orders, total) = order::list(&self.pool, &filter, per_page, offset).await?;
        Ok(Page::new(orders, total, page, per_page))
    }

    /// Order plus line items, ticket, payment stub and delivery location
    pub async fn load_detail(&self, id: i64) -> OrderResult<OrderDetail> {
        let order = order::find_by_id(&self.pool, id)
            .await?
            .ok_or(OrderError::NotFound(id))?;
        let items = order::find_line_items(&self.pool, id).await?;
        let kitchen_ticket = kitchen_ticket::find_by_order(&self.pool, id).await?;
        let payment = payment::find_by_order(&self.pool, id).await?;
        let delivery_location = match order.delivery_location_id {
            Some(location_id) => delivery_location::find_by_id(&self.pool, location_id).await?,
            None => None,
        };
        Ok(OrderDetail {
            order,
            items,
            kitchen_ticket,
            payment,
            delivery_location,
        })
    }

    /// Orders outside the actor's reach read as missing
    async fn load_visible(&self, actor: &Actor, id: i64) -> OrderResult<Order> {
        order::find_by_id(&self.pool, id)
            .await?
            .filter(|o| actor.can_access_order(o))
            .ok_or(OrderError::NotFound(id))
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub async fn update_status(&self, actor: &Actor, id: i64, status: &str) -> OrderResult<Order> {
        if actor.customer_id().is_some() {
            return Err(GuardError::StaffRequired.into());
        }
        let next: OrderStatus = status
            .parse()
            .map_err(|_| OrderError::InvalidStatus(status.to_string()))?;
        let current = self.load_visible(actor, id).await?;
        check_transition(current.status, next)?;

        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        if !order::transition_status(&mut *tx, id, current.status, next, now).await? {
            drop(tx);
            return Err(self.lost_race(id, next).await);
        }
        kitchen_ticket::set_status_for_order(&mut *tx, id, TicketStatus::from(next), now).await?;
        if releases_table(next)
            && current.channel == OrderChannel::DineIn
            && let Some(table_id) = current.table_id
        {
            allocator::release(&mut tx, table_id).await?;
        }
        if next == OrderStatus::Cancelled {
            allocator::cancel_reservation(&mut tx, id).await?;
        }
        tx.commit().await?;

        tracing::info!(order_id = id, from = %current.status, to = %next, "Order status updated");

        let updated = self.reload(id).await?;
        self.publish_status(&updated);
        self.queue.enqueue(DispatchJob::StatusChanged(updated.clone()));
        Ok(updated)
    }

    /// Status moved under us; report the transition from what is there now
    async fn lost_race(&self, id: i64, next: OrderStatus) -> OrderError {
        match order::find_by_id(&self.pool, id).await {
            Ok(Some(now)) => OrderError::InvalidTransition {
                from: now.status,
                to: next,
            },
            Ok(None) => OrderError::NotFound(id),
            Err(e) => e.into(),
        }
    }

    // ========================================================================
    // Payment
    // ========================================================================

    pub async fn update_payment_status(
        &self,
        actor: &Actor,
        id: i64,
        payment_status: &str,
    ) -> OrderResult<Order> {
        if actor.customer_id().is_some() {
            return Err(GuardError::StaffRequired.into());
        }
        let target: PaymentStatus = payment_status
            .parse()
            .map_err(|_| OrderError::InvalidPaymentStatus(payment_status.to_string()))?;
        let current = self.load_visible(actor, id).await?;
        self.apply_payment(current, target).await
    }

    /// Payment provider confirmation. Already-paid orders are returned as-is.
    pub async fn mark_paid(&self, id: i64) -> OrderResult<Order> {
        let current = self.load_visible(&Actor::System, id).await?;
        if current.payment_status == PaymentStatus::Paid {
            tracing::debug!(order_id = id, "Order already paid");
            return Ok(current);
        }
        self.apply_payment(current, PaymentStatus::Paid).await
    }

    /// Paid moves the order (and ticket) to InProgress, Unpaid back to Pending.
    async fn apply_payment(&self, current: Order, target: PaymentStatus) -> OrderResult<Order> {
        let (next, record) = match target {
            PaymentStatus::Paid => (OrderStatus::InProgress, PaymentRecordStatus::Completed),
            PaymentStatus::Unpaid => (OrderStatus::Pending, PaymentRecordStatus::Pending),
        };
        let id = current.id;
        if current.status == OrderStatus::Cancelled {
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }

        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        if !order::set_payment_state(&mut *tx, id, next, target, now).await? {
            drop(tx);
            return Err(self.lost_race(id, next).await);
        }
        kitchen_ticket::set_status_for_order(&mut *tx, id, TicketStatus::from(next), now).await?;
        payment::set_status(&mut *tx, id, record, now).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = id,
            payment_status = target.as_str(),
            status = %next,
            "Order payment updated"
        );

        let updated = self.reload(id).await?;
        self.publish_status(&updated);
        self.queue.enqueue(DispatchJob::PaymentUpdated(updated.clone()));
        Ok(updated)
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Hard-delete a Pending order and give back what it held.
    pub async fn cancel(&self, actor: &Actor, id: i64) -> OrderResult<()> {
        let current = self.load_visible(actor, id).await?;
        if current.status != OrderStatus::Pending {
            return Err(OrderError::NotCancellable {
                id,
                status: current.status,
            });
        }

        let mut tx = self.pool.begin().await?;
        allocator::cancel_reservation(&mut tx, id).await?;
        if !order::delete_pending(&mut tx, id).await? {
            drop(tx);
            return Err(match order::find_by_id(&self.pool, id).await? {
                Some(now) => OrderError::NotCancellable {
                    id,
                    status: now.status,
                },
                None => OrderError::NotFound(id),
            });
        }
        if current.channel == OrderChannel::DineIn
            && let Some(table_id) = current.table_id
        {
            allocator::release(&mut tx, table_id).await?;
        }
        if let Some(location_id) = current.delivery_location_id {
            delivery_location::delete_unsaved(&mut *tx, location_id).await?;
        }
        tx.commit().await?;

        tracing::info!(order_id = id, branch_id = current.branch_id, "Order cancelled and removed");
        self.publish(
            &current,
            |o| LiveEvent::OrderRemoved { order_id: o.id },
            |o| LiveEvent::OrderRemoved { order_id: o.id },
        );
        Ok(())
    }

    // ========================================================================
    // Live events
    // ========================================================================

    async fn reload(&self, id: i64) -> OrderResult<Order> {
        order::find_by_id(&self.pool, id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    fn publish_status(&self, order: &Order) {
        self.publish(
            order,
            |o| LiveEvent::OrderStatusUpdated(Box::new(o.clone())),
            |o| LiveEvent::CustomerOrderStatusUpdated(Box::new(o.clone())),
        );
    }

    /// Branch topic always, customer topic when the order has a customer
    fn publish(
        &self,
        order: &Order,
        branch_event: impl Fn(&Order) -> LiveEvent,
        customer_event: impl Fn(&Order) -> LiveEvent,
    ) {
        self.publisher
            .publish(LiveTopic::Branch(order.branch_id), branch_event(order));
        if let Some(customer_id) = order.customer_id {
            self.publisher
                .publish(LiveTopic::Customer(customer_id), customer_event(order));
        }
    }
}

fn validate_address(address: &DeliveryAddressInput) -> OrderResult<()> {
    if address.address.trim().is_empty() {
        return Err(OrderError::InvalidDeliveryAddress("address is empty".into()));
    }
    if !(-90.0..=90.0).contains(&address.latitude) {
        return Err(OrderError::InvalidDeliveryAddress(format!(
            "latitude {} out of range",
            address.latitude
        )));
    }
    if !(-180.0..=180.0).contains(&address.longitude) {
        return Err(OrderError::InvalidDeliveryAddress(format!(
            "longitude {} out of range",
            address.longitude
        )));
    }
    Ok(())
}
