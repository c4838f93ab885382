//! Orders, purchases and the mod locker.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use modvault_core::pricing::{CartItem, effective_unit_price};
use modvault_core::types::OrderKind;
use modvault_core::{ModId, UserId};

use super::RepositoryError;
use crate::models::{Download, LockerEntry, Order};

const ORDER_COLUMNS: &str =
    "id, user_id, payment_intent_id, kind, amount, currency, status, created_at";

/// A payment to record.
#[derive(Debug, Clone, Copy)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub payment_intent_id: &'a str,
    pub kind: OrderKind,
    pub amount: Decimal,
    pub currency: &'a str,
    pub status: &'a str,
}

/// One mod in a checkout, priced when the checkout started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct CheckoutLine {
    pub mod_id: ModId,
    pub unit_price: Decimal,
}

impl From<&CartItem> for CheckoutLine {
    fn from(item: &CartItem) -> Self {
        Self {
            mod_id: item.mod_id,
            unit_price: effective_unit_price(&item.mod_snapshot),
        }
    }
}

/// Sum of the line prices.
#[must_use]
pub fn lines_total(lines: &[CheckoutLine]) -> Decimal {
    lines.iter().map(|line| line.unit_price).sum()
}

/// Result of recording a payment.
#[derive(Debug, Clone)]
pub struct Fulfilment {
    pub order: Order,
    /// `false` when the payment intent had already been recorded.
    pub newly_fulfilled: bool,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up an order by its payment intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_intent(&self, intent_id: &str) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = $1"
        ))
        .bind(intent_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Remember what a payment intent pays for.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record_checkout(
        &self,
        intent_id: &str,
        user_id: UserId,
        lines: &[CheckoutLine],
    ) -> Result<(), RepositoryError> {
        let mod_ids: Vec<i32> = lines.iter().map(|l| l.mod_id.as_i32()).collect();
        let prices: Vec<Decimal> = lines.iter().map(|l| l.unit_price).collect();
        sqlx::query(
            "INSERT INTO checkout_items (payment_intent_id, user_id, mod_id, unit_price)
             SELECT $1, $2, t.mod_id, t.unit_price
             FROM UNNEST($3::int[], $4::numeric[]) AS t(mod_id, unit_price)
             ON CONFLICT DO NOTHING",
        )
        .bind(intent_id)
        .bind(user_id)
        .bind(&mod_ids)
        .bind(&prices)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Lines recorded for a payment intent created for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn checkout_lines(
        &self,
        intent_id: &str,
        user_id: UserId,
    ) -> Result<Vec<CheckoutLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CheckoutLine>(
            "SELECT mod_id, unit_price FROM checkout_items
             WHERE payment_intent_id = $1 AND user_id = $2
             ORDER BY mod_id",
        )
        .bind(intent_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Record a cart payment: the order, one purchase per line, and removal of
    /// those mods from the cart, in one transaction.
    ///
    /// Recording the same payment intent twice is a no-op that returns the
    /// existing order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn fulfil_cart(
        &self,
        order: NewOrder<'_>,
        lines: &[CheckoutLine],
    ) -> Result<Fulfilment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let Some(created) = insert_order(&mut tx, order).await? else {
            tx.rollback().await?;
            let existing = self
                .find_by_intent(order.payment_intent_id)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            return Ok(Fulfilment {
                order: existing,
                newly_fulfilled: false,
            });
        };

        let mod_ids: Vec<i32> = lines.iter().map(|l| l.mod_id.as_i32()).collect();
        let prices: Vec<Decimal> = lines.iter().map(|l| l.unit_price).collect();
        sqlx::query(
            "INSERT INTO purchases (user_id, mod_id, order_id, price_paid)
             SELECT $1, t.mod_id, $2, t.unit_price
             FROM UNNEST($3::int[], $4::numeric[]) AS t(mod_id, unit_price)
             ON CONFLICT (user_id, mod_id) DO NOTHING",
        )
        .bind(order.user_id)
        .bind(created.id)
        .bind(&mod_ids)
        .bind(&prices)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND mod_id = ANY($2)")
            .bind(order.user_id)
            .bind(&mod_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Fulfilment {
            order: created,
            newly_fulfilled: true,
        })
    }

    /// Whether the user has bought a mod.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owns(&self, user_id: UserId, mod_id: ModId) -> Result<bool, RepositoryError> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM purchases WHERE user_id = $1 AND mod_id = $2)",
        )
        .bind(user_id)
        .bind(mod_id)
        .fetch_one(self.pool)
        .await?;
        Ok(owned)
    }

    /// Everything the user can download: purchases, plus subscription-only
    /// mods while `subscribed`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn locker(
        &self,
        user_id: UserId,
        subscribed: bool,
    ) -> Result<Vec<LockerEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, LockerEntry>(
            "SELECT m.id AS mod_id, m.title, m.category, m.version, m.thumbnail_url,
                    p.purchased_at, (p.id IS NULL) AS via_subscription
             FROM mods m
             LEFT JOIN purchases p ON p.mod_id = m.id AND p.user_id = $1
             WHERE p.id IS NOT NULL OR ($2 AND m.is_subscription_only)
             ORDER BY p.purchased_at DESC NULLS LAST, m.title",
        )
        .bind(user_id)
        .bind(subscribed)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Download details for a mod the user is entitled to, logging the download.
    ///
    /// Returns `None` if the user is not entitled (or the mod does not exist).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn download(
        &self,
        user_id: UserId,
        mod_id: ModId,
        subscribed: bool,
    ) -> Result<Option<Download>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let download = sqlx::query_as::<_, Download>(
            "SELECT m.id AS mod_id, m.title, m.download_url, m.version, m.changelog
             FROM mods m
             WHERE m.id = $2
               AND (EXISTS (SELECT 1 FROM purchases p WHERE p.user_id = $1 AND p.mod_id = m.id)
                    OR ($3 AND m.is_subscription_only))",
        )
        .bind(user_id)
        .bind(mod_id)
        .bind(subscribed)
        .fetch_optional(&mut *tx)
        .await?;

        if download.is_some() {
            sqlx::query("INSERT INTO mod_downloads (user_id, mod_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(mod_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE mods SET download_count = download_count + 1 WHERE id = $1")
                .bind(mod_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(download)
    }
}

/// Insert an order row unless the payment intent is already recorded.
pub(crate) async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: NewOrder<'_>,
) -> Result<Option<Order>, RepositoryError> {
    let created = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO orders (user_id, payment_intent_id, kind, amount, currency, status)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (payment_intent_id) DO NOTHING
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order.user_id)
    .bind(order.payment_intent_id)
    .bind(order.kind)
    .bind(order.amount)
    .bind(order.currency)
    .bind(order.status)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use modvault_core::pricing::ModSnapshot;
    use modvault_core::types::ModCategory;

    use super::*;

    fn item(mod_id: i32, price: i64, discount: Option<i64>) -> CartItem {
        CartItem {
            id: 1.into(),
            user_id: 1.into(),
            mod_id: mod_id.into(),
            added_at: chrono::DateTime::default(),
            mod_snapshot: ModSnapshot {
                id: mod_id.into(),
                title: format!("Mod {mod_id}"),
                price: Some(Decimal::new(price, 2)),
                discount_price: discount.map(|d| Decimal::new(d, 2)),
                category: ModCategory::Cars,
                tags: Vec::new(),
                is_subscription_only: false,
            },
        }
    }

    #[test]
    fn test_lines_priced_at_effective_price() {
        let items = [item(1, 1999, Some(1499)), item(2, 500, None)];
        let lines: Vec<CheckoutLine> = items.iter().map(CheckoutLine::from).collect();
        assert_eq!(lines[0].unit_price, Decimal::new(1499, 2));
        assert_eq!(lines[1].unit_price, Decimal::new(500, 2));
        assert_eq!(lines_total(&lines), Decimal::new(1999, 2));
    }

    #[test]
    fn test_free_lines_total_zero() {
        let lines = vec![CheckoutLine::from(&item(3, 0, None))];
        assert!(lines_total(&lines).is_zero());
    }
}
