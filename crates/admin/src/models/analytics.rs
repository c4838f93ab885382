//! Dashboard totals.

use rust_decimal::Decimal;
use serde::Serialize;

use modvault_core::ModId;

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub total_users: i64,
    pub premium_users: i64,
    pub banned_users: i64,
    /// Sum of succeeded orders.
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub open_tickets: i64,
    pub total_downloads: i64,
    pub active_subscriptions: i64,
    pub top_mods: Vec<TopMod>,
}

/// Best sellers by number of purchases.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopMod {
    pub id: ModId,
    pub title: String,
    pub sales: i64,
    pub revenue: Decimal,
    pub downloads: i32,
}
