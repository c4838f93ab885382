//! Mod catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use modvault_core::ModId;
use modvault_core::pricing::{ModSnapshot, effective_unit_price};
use modvault_core::types::ModCategory;

/// A catalog listing. Download details are only exposed through the locker.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Mod {
    pub id: ModId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category: ModCategory,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub version: String,
    pub is_featured: bool,
    pub is_subscription_only: bool,
    pub download_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Mod {
    /// The pricing view of this mod.
    #[must_use]
    pub fn snapshot(&self) -> ModSnapshot {
        ModSnapshot {
            id: self.id,
            title: self.title.clone(),
            price: Some(self.price),
            discount_price: self.discount_price,
            category: self.category,
            tags: self.tags.clone(),
            is_subscription_only: self.is_subscription_only,
        }
    }

    /// What a buyer pays right now.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective_unit_price(&self.snapshot())
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Title,
    Popular,
}

impl ModSort {
    /// `ORDER BY` clause. Sorting by price uses the effective price.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "COALESCE(discount_price, price) ASC, id ASC",
            Self::PriceDesc => "COALESCE(discount_price, price) DESC, id DESC",
            Self::Title => "lower(title) ASC, id ASC",
            Self::Popular => "download_count DESC, id DESC",
        }
    }
}

/// Query string for `GET /api/mods`. Also the catalog cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct ModQuery {
    pub category: Option<ModCategory>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: ModSort,
    pub page: Option<u32>,
}

impl ModQuery {
    /// Drop blank filters so equivalent queries share a cache entry.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.search = self
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self.tag = self
            .tag
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        self.page = Some(self.page.unwrap_or(1).max(1));
        self
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize)]
pub struct ModPage {
    pub mods: Vec<Mod>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_query_shares_cache_key() {
        let a = ModQuery {
            search: Some("  Drift ".into()),
            tag: Some(String::new()),
            ..ModQuery::default()
        }
        .normalized();
        let b = ModQuery {
            search: Some("drift".into()),
            page: Some(1),
            ..ModQuery::default()
        }
        .normalized();
        assert_eq!(a, b);
    }

    #[test]
    fn test_price_sort_uses_discount() {
        assert!(ModSort::PriceAsc.order_by().contains("COALESCE(discount_price, price)"));
    }
}
