//! Orders, owned mods and downloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use modvault_core::types::{ModCategory, OrderKind};
use modvault_core::{ModId, OrderId, UserId};

/// A completed payment.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub payment_intent_id: String,
    pub kind: OrderKind,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A mod in the user's locker.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LockerEntry {
    pub mod_id: ModId,
    pub title: String,
    pub category: ModCategory,
    pub version: String,
    pub thumbnail_url: Option<String>,
    /// `None` for subscription-only mods unlocked by an active subscription.
    pub purchased_at: Option<DateTime<Utc>>,
    pub via_subscription: bool,
}

/// What a download request hands back.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Download {
    pub mod_id: ModId,
    pub title: String,
    pub download_url: String,
    pub version: String,
    pub changelog: Option<String>,
}
