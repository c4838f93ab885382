//! Subscription tiers and user subscriptions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use modvault_core::types::SubscriptionStatus;
use modvault_core::{SubscriptionId, TierId, UserId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubscriptionTier {
    pub id: TierId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub duration_days: i32,
    pub features: Vec<String>,
}

/// A user's subscription joined with its tier name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub tier_id: TierId,
    pub tier_name: String,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Whether the subscription still grants access at `now`.
    ///
    /// A cancelled subscription keeps working until its period ends.
    #[must_use]
    pub fn grants_access(&self, now: DateTime<Utc>) -> bool {
        !matches!(self.status, SubscriptionStatus::Expired) && self.current_period_end > now
    }
}
