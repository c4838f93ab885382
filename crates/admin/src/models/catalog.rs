//! Mods as edited in the back office, download details included.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use modvault_core::ModId;
use modvault_core::types::ModCategory;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminMod {
    pub id: ModId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category: ModCategory,
    pub tags: Vec<String>,
    pub download_url: String,
    pub thumbnail_url: Option<String>,
    pub version: String,
    pub changelog: Option<String>,
    pub is_featured: bool,
    pub is_subscription_only: bool,
    pub download_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query string for `GET /api/admin/mods`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModFilter {
    pub search: Option<String>,
    pub category: Option<ModCategory>,
    pub featured: Option<bool>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModPage {
    pub mods: Vec<AdminMod>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}
