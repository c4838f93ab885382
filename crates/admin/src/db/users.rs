//! User management queries.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use modvault_core::{Email, RoleId, UserId};

use super::{RepositoryError, like_pattern, page_bounds, search_term};
use crate::models::{RoleRef, UserDetail, UserFilter, UserPage, UserSummary, UserUpdate};

/// Users per admin page.
pub const PER_PAGE: u32 = 25;

const USER_COLUMNS: &str =
    "id, username, email, is_admin, is_premium, is_banned, last_login_at, created_at";

/// What login needs to decide whether someone may enter the back office.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginCandidate {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub is_admin: bool,
    pub is_banned: bool,
    pub password_hash: String,
}

/// Current back-office standing of an account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessRecord {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub is_admin: bool,
    pub is_banned: bool,
    pub role_count: i64,
    pub permissions: Vec<String>,
}

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search, filter and sort users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &UserFilter) -> Result<UserPage, RepositoryError> {
        let (limit, offset) = page_bounds(filter.page, PER_PAGE);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY ").push(filter.sort.order_by());
        select.push(" LIMIT ").push_bind(limit);
        select.push(" OFFSET ").push_bind(offset);
        let users = select
            .build_query_as::<UserSummary>()
            .fetch_all(self.pool)
            .await?;

        Ok(UserPage {
            users,
            page: filter.page.unwrap_or(1).max(1),
            per_page: PER_PAGE,
            total,
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<UserSummary>, RepositoryError> {
        let user = sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// User with tracking fields, roles and purchase totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: UserId) -> Result<Option<UserDetail>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: UserSummary,
            last_ip: Option<String>,
            last_device: Option<String>,
            last_country: Option<String>,
        }

        let Some(row) = sqlx::query_as::<_, Row>(&format!(
            "SELECT {USER_COLUMNS}, last_ip, last_device, last_country FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let roles = self.roles(id).await?;
        let (purchase_count, total_spent) = sqlx::query_as::<_, (i64, Decimal)>(
            "SELECT COUNT(*), COALESCE(SUM(price_paid), 0) FROM purchases WHERE user_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(Some(UserDetail {
            user: row.user,
            last_ip: row.last_ip,
            last_device: row.last_device,
            last_country: row.last_country,
            roles,
            purchase_count,
            total_spent,
        }))
    }

    /// Apply the flags that are set. Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<Option<UserSummary>, RepositoryError> {
        let user = sqlx::query_as::<_, UserSummary>(&format!(
            "UPDATE users
             SET is_admin = COALESCE($2, is_admin),
                 is_premium = COALESCE($3, is_premium),
                 is_banned = COALESCE($4, is_banned),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.is_admin)
        .bind(update.is_premium)
        .bind(update.is_banned)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Roles assigned to the user, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn roles(&self, id: UserId) -> Result<Vec<RoleRef>, RepositoryError> {
        let roles = sqlx::query_as::<_, RoleRef>(
            "SELECT r.id, r.name
             FROM roles r
             JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = $1
             ORDER BY r.name",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(roles)
    }

    /// Replace the user's roles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or any role does not
    /// exist; nothing is changed in that case.
    pub async fn set_roles(
        &self,
        id: UserId,
        role_ids: &[RoleId],
    ) -> Result<Vec<RoleRef>, RepositoryError> {
        let ids: Vec<i32> = role_ids.iter().map(RoleId::as_i32).collect();
        let mut tx = self.pool.begin().await?;

        let user_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let known_roles =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_one(&mut *tx)
                .await?;
        let distinct: BTreeSet<i32> = ids.iter().copied().collect();
        if !user_exists || usize::try_from(known_roles).ok() != Some(distinct.len()) {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, role_id FROM UNNEST($2::int[]) AS t(role_id)
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.roles(id).await
    }

    /// Flags, role count and the union of role permissions in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn access(&self, id: UserId) -> Result<Option<AccessRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, AccessRecord>(
            "SELECT u.id, u.username, u.email, u.is_admin, u.is_banned,
                    (SELECT COUNT(*) FROM user_roles ur WHERE ur.user_id = u.id) AS role_count,
                    ARRAY(
                        SELECT DISTINCT rp.permission_id
                        FROM role_permissions rp
                        JOIN user_roles ur ON ur.role_id = rp.role_id
                        WHERE ur.user_id = u.id
                    ) AS permissions
             FROM users u
             WHERE u.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_login(
        &self,
        email: &Email,
    ) -> Result<Option<LoginCandidate>, RepositoryError> {
        let candidate = sqlx::query_as::<_, LoginCandidate>(
            "SELECT id, username, email, is_admin, is_banned, password_hash
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(candidate)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_login(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(term) = search_term(filter.search.as_deref()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(admin) = filter.admin {
        builder.push(" AND is_admin = ").push_bind(admin);
    }
    if let Some(premium) = filter.premium {
        builder.push(" AND is_premium = ").push_bind(premium);
    }
    if let Some(banned) = filter.banned {
        builder.push(" AND is_banned = ").push_bind(banned);
    }
}
