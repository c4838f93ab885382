//! Cart rows.
//!
//! A cart is the set of `cart_items` rows for a user. Each row is one mod at
//! quantity one; `(user_id, mod_id)` is unique so adding twice is a no-op.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use modvault_core::pricing::{CartItem, ModSnapshot};
use modvault_core::types::ModCategory;
use modvault_core::{CartItemId, ModId, UserId};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartItemId,
    user_id: UserId,
    mod_id: ModId,
    added_at: DateTime<Utc>,
    title: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    category: ModCategory,
    tags: Vec<String>,
    is_subscription_only: bool,
}

impl From<CartRow> for CartItem {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            mod_id: row.mod_id,
            added_at: row.added_at,
            mod_snapshot: ModSnapshot {
                id: row.mod_id,
                title: row.title,
                price: Some(row.price),
                discount_price: row.discount_price,
                category: row.category,
                tags: row.tags,
                is_subscription_only: row.is_subscription_only,
            },
        }
    }
}

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart, oldest row first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT c.id, c.user_id, c.mod_id, c.added_at,
                    m.title, m.price, m.discount_price, m.category, m.tags,
                    m.is_subscription_only
             FROM cart_items c
             JOIN mods m ON m.id = c.mod_id
             WHERE c.user_id = $1
             ORDER BY c.added_at, c.id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Add a mod. Returns `false` if it was already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add(&self, user_id: UserId, mod_id: ModId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO cart_items (user_id, mod_id) VALUES ($1, $2)
             ON CONFLICT (user_id, mod_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(mod_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a mod. Returns `false` if it was not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user_id: UserId, mod_id: ModId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND mod_id = $2")
            .bind(user_id)
            .bind(mod_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the cart. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
