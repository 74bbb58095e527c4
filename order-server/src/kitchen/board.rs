//! Kitchen board derivation
//!
//! Pure: rows in, sorted views out. Wait time is measured from the ticket's
//! own `created_at`, never from the order.

use shared::models::{KitchenTicketItem, KitchenTicketView, OrderChannel, TicketPriority};
use shared::util::whole_minutes_between;
use std::collections::HashMap;

use crate::db::repository::kitchen_ticket::{BoardItemRow, BoardRow};

/// Waiting longer than this many minutes is urgent
pub const URGENT_AFTER_MINUTES: i64 = 15;
/// Waiting longer than this many minutes is a warning
pub const WARNING_AFTER_MINUTES: i64 = 10;

pub fn priority_for(minutes_waiting: i64) -> TicketPriority {
    if minutes_waiting > URGENT_AFTER_MINUTES {
        TicketPriority::Urgent
    } else if minutes_waiting > WARNING_AFTER_MINUTES {
        TicketPriority::Warning
    } else {
        TicketPriority::Normal
    }
}

pub fn table_label(channel: OrderChannel, table_number: Option<i32>) -> String {
    match (channel, table_number) {
        (OrderChannel::DineIn, Some(number)) => format!("Table {number}"),
        (OrderChannel::DineIn, None) => "Dine-in".to_string(),
        (OrderChannel::Takeaway, _) => "Takeaway".to_string(),
        (OrderChannel::Delivery, _) => "Delivery".to_string(),
    }
}

/// Urgent first, then longest wait; ties go to the older ticket, then the
/// lower id.
pub fn sort_board(views: &mut [KitchenTicketView]) {
    views.sort_by(|a, b| {
        let a_urgent = a.priority == TicketPriority::Urgent;
        let b_urgent = b.priority == TicketPriority::Urgent;
        b_urgent
            .cmp(&a_urgent)
            .then(b.minutes_waiting.cmp(&a.minutes_waiting))
            .then(a.created_at.cmp(&b.created_at))
            .then(a.ticket_id.cmp(&b.ticket_id))
    });
}

pub fn build_board(rows: Vec<BoardRow>, items: Vec<BoardItemRow>, now: i64) -> Vec<KitchenTicketView> {
    let mut items_by_order: HashMap<i64, Vec<KitchenTicketItem>> = HashMap::new();
    for item in items {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(KitchenTicketItem {
                name: item.name,
                quantity: item.quantity,
            });
    }

    let mut views: Vec<KitchenTicketView> = rows
        .into_iter()
        .map(|row| {
            let minutes_waiting = whole_minutes_between(row.created_at, now);
            KitchenTicketView {
                ticket_id: row.ticket_id,
                order_id: row.order_id,
                status: row.status,
                channel: row.channel,
                table_label: table_label(row.channel, row.table_number),
                minutes_waiting,
                priority: priority_for(minutes_waiting),
                created_at: row.created_at,
                items: items_by_order.remove(&row.order_id).unwrap_or_default(),
            }
        })
        .collect();

    sort_board(&mut views);
    views
}
