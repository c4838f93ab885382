//! Promotional deal eligibility.
//!
//! Deals are a fixed catalog of descriptors, each with a predicate evaluated
//! against the current cart. Nothing is persisted; eligibility is recomputed
//! whenever the cart is read.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::pricing::{CartItem, summarize};
use crate::types::ModCategory;

/// Snapshot of the cart a deal predicate is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct DealContext<'a> {
    pub items: &'a [CartItem],
    pub total: Decimal,
}

impl<'a> DealContext<'a> {
    /// Build a context, computing the total from the items.
    #[must_use]
    pub fn from_items(items: &'a [CartItem]) -> Self {
        Self {
            items,
            total: summarize(items).total,
        }
    }

    fn has_category(&self, category: ModCategory) -> bool {
        self.items
            .iter()
            .any(|item| item.mod_snapshot.category == category)
    }
}

/// A promotional offer shown when its predicate holds.
#[derive(Debug, Clone, Serialize)]
pub struct Deal {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub is_active: fn(&DealContext<'_>) -> bool,
}

/// The deal catalog.
pub static DEALS: &[Deal] = &[
    Deal {
        id: "drift-starter",
        title: "Drift Starter Pack",
        description: "Add another drift mod and get a free tuning preset bundle.",
        is_active: |ctx| ctx.has_category(ModCategory::Drift) && ctx.items.len() < 3,
    },
    Deal {
        id: "bundle-three",
        title: "Bundle of Three",
        description: "Three or more mods in one order unlock a bonus livery pack.",
        is_active: |ctx| ctx.items.len() >= 3,
    },
    Deal {
        id: "big-spender",
        title: "Garage Pass",
        description: "Orders of $50 or more include a month of early-access builds.",
        is_active: |ctx| ctx.total >= Decimal::new(5000, 2),
    },
    Deal {
        id: "first-mod",
        title: "First Mod",
        description: "Only one mod in your cart? Browse the featured picks for more.",
        is_active: |ctx| ctx.items.len() == 1,
    },
];

/// All deals whose predicate currently holds, in catalog order.
#[must_use]
pub fn active_deals<'d>(ctx: &DealContext<'_>) -> Vec<&'d Deal> {
    DEALS.iter().filter(|deal| (deal.is_active)(ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::fixtures::item;

    fn ids(items: &[CartItem]) -> Vec<&'static str> {
        active_deals(&DealContext::from_items(items))
            .into_iter()
            .map(|d| d.id)
            .collect()
    }

    #[test]
    fn test_empty_cart_has_no_deals() {
        assert!(ids(&[]).is_empty());
    }

    #[test]
    fn test_drift_starter_requires_drift_and_fewer_than_three() {
        let two = vec![
            item(1, Some(999), None, ModCategory::Drift),
            item(2, Some(499), None, ModCategory::Maps),
        ];
        assert!(ids(&two).contains(&"drift-starter"));

        let three = vec![
            item(1, Some(999), None, ModCategory::Drift),
            item(2, Some(499), None, ModCategory::Maps),
            item(3, Some(499), None, ModCategory::Ui),
        ];
        let active = ids(&three);
        assert!(!active.contains(&"drift-starter"));
        assert!(active.contains(&"bundle-three"));
    }

    #[test]
    fn test_big_spender_uses_discounted_total() {
        let cart = vec![item(1, Some(6000), Some(4500), ModCategory::Cars)];
        assert!(!ids(&cart).contains(&"big-spender"));

        let cart = vec![item(1, Some(6000), Some(5000), ModCategory::Cars)];
        assert!(ids(&cart).contains(&"big-spender"));
    }

    #[test]
    fn test_first_mod() {
        let cart = vec![item(1, Some(100), None, ModCategory::Sounds)];
        assert_eq!(ids(&cart), vec!["first-mod"]);
    }
}
