//! Subscription tiers and user subscriptions.

use sqlx::PgPool;

use modvault_core::{TierId, UserId};

use super::RepositoryError;
use super::orders::{NewOrder, insert_order};
use crate::models::{Subscription, SubscriptionTier};

const SUBSCRIPTION_SELECT: &str = "SELECT s.id, s.user_id, s.tier_id, t.name AS tier_name, \
     s.status, s.current_period_start, s.current_period_end, s.canceled_at \
     FROM subscriptions s JOIN subscription_tiers t ON t.id = s.tier_id";

pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Tiers on sale, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_tiers(&self) -> Result<Vec<SubscriptionTier>, RepositoryError> {
        let tiers = sqlx::query_as::<_, SubscriptionTier>(
            "SELECT id, name, description, price, duration_days, features
             FROM subscription_tiers
             WHERE is_active
             ORDER BY sort_order, price",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(tiers)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_tier(&self, id: TierId) -> Result<Option<SubscriptionTier>, RepositoryError> {
        let tier = sqlx::query_as::<_, SubscriptionTier>(
            "SELECT id, name, description, price, duration_days, features
             FROM subscription_tiers
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(tier)
    }

    /// The user's most recent subscription that has not run out.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn current(&self, user_id: UserId) -> Result<Option<Subscription>, RepositoryError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "{SUBSCRIPTION_SELECT}
             WHERE s.user_id = $1 AND s.status <> 'expired' AND s.current_period_end > NOW()
             ORDER BY s.current_period_end DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(subscription)
    }

    /// Record a subscription payment and start (or extend) the subscription.
    ///
    /// A new period starts at the later of now and the end of the current
    /// period. Recording the same payment intent twice returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn activate(
        &self,
        order: NewOrder<'_>,
        tier: &SubscriptionTier,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let Some(created) = insert_order(&mut tx, order).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE subscriptions SET status = 'expired'
             WHERE user_id = $1 AND status <> 'expired' AND current_period_end <= NOW()",
        )
        .bind(order.user_id)
        .execute(&mut *tx)
        .await?;

        let subscription_id: i32 = sqlx::query_scalar(
            "WITH start AS (
                 SELECT GREATEST(NOW(), COALESCE(MAX(current_period_end), NOW())) AS at
                 FROM subscriptions
                 WHERE user_id = $1 AND status <> 'expired'
             )
             INSERT INTO subscriptions (user_id, tier_id, order_id, status,
                                        current_period_start, current_period_end)
             SELECT $1, $2, $3, 'active', start.at, start.at + make_interval(days => $4)
             FROM start
             RETURNING id",
        )
        .bind(order.user_id)
        .bind(tier.id)
        .bind(created.id)
        .bind(tier.duration_days)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET is_premium = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(order.user_id)
            .execute(&mut *tx)
            .await?;

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "{SUBSCRIPTION_SELECT} WHERE s.id = $1"
        ))
        .bind(subscription_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(subscription))
    }

    /// Cancel at period end. Returns the updated subscription, or `None` if the
    /// user has nothing active to cancel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn cancel(&self, user_id: UserId) -> Result<Option<Subscription>, RepositoryError> {
        let updated: Option<i32> = sqlx::query_scalar(
            "UPDATE subscriptions SET status = 'canceled', canceled_at = NOW()
             WHERE user_id = $1 AND status = 'active' AND current_period_end > NOW()
             RETURNING id",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }
        self.current(user_id).await
    }
}
