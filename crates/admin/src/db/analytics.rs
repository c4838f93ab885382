//! Back-office totals.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{Analytics, TopMod};

/// How many best sellers the dashboard lists.
const TOP_MODS_LIMIT: i64 = 10;

pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn summary(&self) -> Result<Analytics, RepositoryError> {
        let (total_users, premium_users, banned_users) = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE is_premium),
                    COUNT(*) FILTER (WHERE is_banned)
             FROM users",
        )
        .fetch_one(self.pool)
        .await?;

        let (total_orders, total_revenue) = sqlx::query_as::<_, (i64, Decimal)>(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0)
             FROM orders WHERE status = 'succeeded'",
        )
        .fetch_one(self.pool)
        .await?;

        let open_tickets = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM support_tickets WHERE status IN ('open', 'in_progress')",
        )
        .fetch_one(self.pool)
        .await?;

        let total_downloads = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mod_downloads")
            .fetch_one(self.pool)
            .await?;

        let active_subscriptions = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions
             WHERE status IN ('active', 'canceled') AND current_period_end > NOW()",
        )
        .fetch_one(self.pool)
        .await?;

        let top_mods = self.top_mods(TOP_MODS_LIMIT).await?;

        Ok(Analytics {
            total_users,
            premium_users,
            banned_users,
            total_revenue,
            total_orders,
            open_tickets,
            total_downloads,
            active_subscriptions,
            top_mods,
        })
    }

    /// Mods ranked by purchases.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_mods(&self, limit: i64) -> Result<Vec<TopMod>, RepositoryError> {
        let mods = sqlx::query_as::<_, TopMod>(
            "SELECT m.id, m.title,
                    COUNT(p.id) AS sales,
                    COALESCE(SUM(p.price_paid), 0) AS revenue,
                    m.download_count AS downloads
             FROM mods m
             JOIN purchases p ON p.mod_id = m.id
             GROUP BY m.id
             ORDER BY sales DESC, revenue DESC, m.id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(mods)
    }
}
