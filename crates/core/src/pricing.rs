//! Cart pricing.
//!
//! Every cart row is implicitly quantity 1. A row's effective unit price is
//! its discount price when one is set, otherwise the list price. A missing
//! list price counts as zero rather than being an error, so a half-populated
//! product snapshot never breaks the cart page.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, ModCategory, ModId, Price, UserId};

/// Denormalised product data embedded in a cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSnapshot {
    pub id: ModId,
    pub title: String,
    /// List price.
    pub price: Option<Decimal>,
    /// Sale price overriding `price` when present.
    pub discount_price: Option<Decimal>,
    pub category: ModCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_subscription_only: bool,
}

/// A row in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub mod_id: ModId,
    pub added_at: DateTime<Utc>,
    #[serde(rename = "mod")]
    pub mod_snapshot: ModSnapshot,
}

/// Computed totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartSummary {
    /// Number of rows.
    pub item_count: usize,
    /// Sum of list prices before discounts.
    pub subtotal: Decimal,
    /// Sum of `price - discount_price` over discounted rows.
    pub savings: Decimal,
    /// Sum of effective unit prices. This is the amount charged.
    pub total: Decimal,
}

impl CartSummary {
    /// Whether the cart has nothing in it.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

/// The price a row is charged at.
#[must_use]
pub fn effective_unit_price(snapshot: &ModSnapshot) -> Decimal {
    snapshot
        .discount_price
        .or(snapshot.price)
        .unwrap_or(Decimal::ZERO)
}

/// How much the discount takes off the list price; zero when not discounted.
#[must_use]
pub fn savings_for(snapshot: &ModSnapshot) -> Decimal {
    snapshot.discount_price.map_or(Decimal::ZERO, |discount| {
        snapshot.price.unwrap_or(Decimal::ZERO) - discount
    })
}

/// Compute totals for an ordered list of cart rows.
#[must_use]
pub fn summarize(items: &[CartItem]) -> CartSummary {
    items.iter().fold(
        CartSummary {
            item_count: items.len(),
            ..CartSummary::default()
        },
        |mut acc, item| {
            let snapshot = &item.mod_snapshot;
            acc.subtotal += snapshot.price.unwrap_or(Decimal::ZERO);
            acc.savings += savings_for(snapshot);
            acc.total += effective_unit_price(snapshot);
            acc
        },
    )
}

/// Convert a dollar amount to cents for the payment provider.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    Price::usd(amount).minor_units()
}

/// Format a dollar amount as `$25.00`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    Price::usd(amount).to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn item(
        id: i32,
        price: Option<i64>,
        discount: Option<i64>,
        category: ModCategory,
    ) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            user_id: UserId::new(1),
            mod_id: ModId::new(id),
            added_at: DateTime::<Utc>::default(),
            mod_snapshot: ModSnapshot {
                id: ModId::new(id),
                title: format!("Mod {id}"),
                price: price.map(|p| Decimal::new(p, 2)),
                discount_price: discount.map(|p| Decimal::new(p, 2)),
                category,
                tags: vec![],
                is_subscription_only: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::item;
    use super::*;

    #[test]
    fn test_discount_overrides_price() {
        let row = item(1, Some(2000), Some(1500), ModCategory::Cars);
        assert_eq!(effective_unit_price(&row.mod_snapshot), Decimal::new(15, 0));
        assert_eq!(savings_for(&row.mod_snapshot), Decimal::new(5, 0));
    }

    #[test]
    fn test_reference_cart() {
        let cart = vec![
            item(1, Some(2000), Some(1500), ModCategory::Cars),
            item(2, Some(1000), None, ModCategory::Maps),
        ];
        let summary = summarize(&cart);
        assert_eq!(summary.total, Decimal::new(2500, 2));
        assert_eq!(summary.savings, Decimal::new(500, 2));
        assert_eq!(summary.subtotal, Decimal::new(3000, 2));
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let cart = vec![
            item(1, None, None, ModCategory::Tools),
            item(2, Some(499), None, ModCategory::Ui),
        ];
        let summary = summarize(&cart);
        assert_eq!(summary.total, Decimal::new(499, 2));
        assert_eq!(summary.savings, Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart() {
        let summary = summarize(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_minor_units_and_format() {
        assert_eq!(to_minor_units(Decimal::new(2500, 2)), Some(2500));
        assert_eq!(format_usd(Decimal::new(25, 0)), "$25.00");
    }

    #[test]
    fn test_total_plus_savings_equals_subtotal() {
        let cart = vec![
            item(1, Some(1299), Some(999), ModCategory::Drift),
            item(2, Some(500), None, ModCategory::Sounds),
            item(3, Some(2450), Some(2000), ModCategory::Tracks),
        ];
        let summary = summarize(&cart);
        assert_eq!(summary.total + summary.savings, summary.subtotal);
    }
}
