//! Money calculation with rust_decimal
//!
//! Prices arrive as `f64` from SQLite; arithmetic happens in `Decimal` and
//! the result is rounded half-up to 2 dp before going back to `f64`.

use rust_decimal::prelude::*;

use crate::db::repository::order::NewLineItem;

const DECIMAL_PLACES: u32 = 2;

#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

pub fn line_total(unit_price: f64, quantity: i32) -> Decimal {
    to_decimal(unit_price) * Decimal::from(quantity)
}

/// Sum of `unit_price * quantity` over all lines
pub fn order_total(items: &[NewLineItem]) -> f64 {
    let total: Decimal = items
        .iter()
        .map(|i| line_total(i.unit_price, i.quantity))
        .sum();
    to_f64(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(unit_price: f64, quantity: i32) -> NewLineItem {
        NewLineItem {
            menu_item_id: 1,
            name: "x".into(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn no_float_drift() {
        // 0.1 * 3 在 f64 下是 0.30000000000000004
        assert_eq!(order_total(&[line(0.1, 3)]), 0.3);
        assert_eq!(order_total(&[line(19.99, 3), line(0.01, 1)]), 59.98);
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(to_f64(Decimal::new(1005, 3)), 1.01);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(order_total(&[]), 0.0);
    }
}
