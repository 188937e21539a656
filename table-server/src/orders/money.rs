//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization.

use rust_decimal::prelude::*;
use shared::models::OrderItem;

/// Rounding: 2 decimal places, half away from zero
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price (1,000,000)
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum quantity of one menu item in an order, after merging
pub const MAX_QUANTITY: i32 = 9_999;

/// Convert f64 to Decimal (NaN / infinity become zero)
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// A sellable price: finite, positive, within bounds
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0 && price <= MAX_PRICE
}

/// A discount percentage within 0..=100
pub fn is_valid_discount(discount_percent: f64) -> bool {
    discount_percent.is_finite() && (0.0..=100.0).contains(&discount_percent)
}

/// `unit_price × quantity × (1 − discount/100)`, unrounded
pub fn line_total(item: &OrderItem) -> Decimal {
    let unit_price = to_decimal(item.unit_price);
    let quantity = Decimal::from(item.quantity);
    let discount = to_decimal(item.discount_percent) / Decimal::ONE_HUNDRED;
    unit_price * quantity * (Decimal::ONE - discount)
}

/// Order total over all lines, rounded once at the end
pub fn order_total(items: &[OrderItem]) -> f64 {
    to_f64(items.iter().map(line_total).sum())
}
