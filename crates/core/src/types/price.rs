//! Checkout pricing rule.
//!
//! A product has a retail `price` and an optional bulk tier: once a single
//! cart line reaches `bulk_threshold` units, every unit on that line is
//! charged `wholesale_price`. A threshold of zero (or below) disables the
//! tier. The comparison is inclusive: exactly `bulk_threshold` units already
//! qualify.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which price tier was applied to a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Retail,
    Wholesale,
}

/// The price resolved for one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePrice {
    /// Per-unit price that will be frozen onto the order item.
    pub unit_price: Decimal,
    /// Tier that produced `unit_price`.
    pub tier: PriceTier,
    /// `unit_price * quantity`.
    pub line_total: Decimal,
}

/// Resolve the per-unit price for `quantity` units.
///
/// # Example
///
/// ```
/// use bazaar_core::{PriceTier, unit_price};
/// use rust_decimal::Decimal;
///
/// let price = Decimal::from(100);
/// let wholesale = Decimal::from(80);
///
/// assert_eq!(unit_price(price, wholesale, 10, 9).tier, PriceTier::Retail);
/// assert_eq!(unit_price(price, wholesale, 10, 10).tier, PriceTier::Wholesale);
/// assert_eq!(unit_price(price, wholesale, 0, 500).tier, PriceTier::Retail);
/// ```
#[must_use]
pub fn unit_price(
    price: Decimal,
    wholesale_price: Decimal,
    bulk_threshold: i32,
    quantity: i32,
) -> LinePrice {
    let wholesale = bulk_threshold > 0 && quantity >= bulk_threshold;
    let (unit_price, tier) = if wholesale {
        (wholesale_price, PriceTier::Wholesale)
    } else {
        (price, PriceTier::Retail)
    };

    LinePrice {
        unit_price,
        tier,
        line_total: unit_price * Decimal::from(quantity),
    }
}

/// Sum of line totals.
#[must_use]
pub fn order_total<'a>(lines: impl IntoIterator<Item = &'a LinePrice>) -> Decimal {
    lines.into_iter().map(|l| l.line_total).sum()
}
