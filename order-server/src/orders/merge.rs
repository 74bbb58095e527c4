//! Line item merging

use shared::models::OrderItemInput;

use super::error::OrderError;

/// Upper bound for a single merged line
pub const MAX_LINE_QUANTITY: i32 = 9999;

/// Collapse duplicate menu items into one line each, summing quantities.
///
/// Lines keep the order in which each menu item first appeared. Any quantity
/// below 1, or a merged quantity above [`MAX_LINE_QUANTITY`], is rejected.
pub fn merge_items(items: &[OrderItemInput]) -> Result<Vec<(i64, i32)>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::Empty);
    }

    let mut merged: Vec<(i64, i32)> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity < 1 {
            return Err(OrderError::InvalidQuantity {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
            });
        }
        match merged.iter_mut().find(|(id, _)| *id == item.menu_item_id) {
            Some((_, qty)) => *qty = qty.saturating_add(item.quantity),
            None => merged.push((item.menu_item_id, item.quantity)),
        }
    }

    if let Some(&(menu_item_id, quantity)) = merged.iter().find(|(_, q)| *q > MAX_LINE_QUANTITY) {
        return Err(OrderError::InvalidQuantity {
            menu_item_id,
            quantity,
        });
    }

    Ok(merged)
}
