//! Roles and their permission sets.
//!
//! Permission IDs are validated against the compiled-in catalog before they
//! reach this module; the database stores them as plain text.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};

use modvault_core::RoleId;
use modvault_core::validation::RoleInput;

use super::RepositoryError;
use crate::models::{Role, RoleDetail};

const ROLE_COLUMNS: &str = "id, name, description, is_system, created_at, updated_at";

pub struct RoleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every role with its permissions and holder count, system roles first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self) -> Result<Vec<RoleDetail>, RepositoryError> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles ORDER BY is_system DESC, name"
        ))
        .fetch_all(self.pool)
        .await?;

        let grants = sqlx::query_as::<_, (RoleId, String)>(
            "SELECT role_id, permission_id FROM role_permissions ORDER BY permission_id",
        )
        .fetch_all(self.pool)
        .await?;
        let counts = sqlx::query_as::<_, (RoleId, i64)>(
            "SELECT role_id, COUNT(*) FROM user_roles GROUP BY role_id",
        )
        .fetch_all(self.pool)
        .await?;

        let mut permissions: HashMap<RoleId, Vec<String>> = HashMap::new();
        for (role_id, permission) in grants {
            permissions.entry(role_id).or_default().push(permission);
        }
        let counts: HashMap<RoleId, i64> = counts.into_iter().collect();

        Ok(roles
            .into_iter()
            .map(|role| RoleDetail {
                permissions: permissions.remove(&role.id).unwrap_or_default(),
                user_count: counts.get(&role.id).copied().unwrap_or(0),
                role,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: RoleId) -> Result<Option<RoleDetail>, RepositoryError> {
        let Some(role) = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        let user_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_roles WHERE role_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(Some(RoleDetail {
            role,
            permissions,
            user_count,
        }))
    }

    /// Distinct permissions granted by any of `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn permissions_of(&self, ids: &[RoleId]) -> Result<Vec<String>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(RoleId::as_i32).collect();
        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT permission_id FROM role_permissions
             WHERE role_id = ANY($1)
             ORDER BY permission_id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        Ok(permissions)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, input: &RoleInput) -> Result<RoleDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let role = sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}"
        ))
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "role"))?;

        replace_permissions(&mut tx, role.id, &input.permissions).await?;
        tx.commit().await?;

        self.get(role.id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Update name, description and permissions. System roles keep their name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the role does not exist and
    /// `RepositoryError::Conflict` if the new name is taken or a system role
    /// would be renamed.
    pub async fn update(
        &self,
        id: RoleId,
        input: &RoleInput,
    ) -> Result<RoleDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if current.is_system && current.name != input.name.trim() {
            return Err(RepositoryError::Conflict(
                "System roles cannot be renamed".to_owned(),
            ));
        }

        sqlx::query(
            "UPDATE roles SET name = $2, description = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "role"))?;

        replace_permissions(&mut tx, id, &input.permissions).await?;
        tx.commit().await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a custom role. Holders lose it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the role does not exist and
    /// `RepositoryError::Conflict` for system roles.
    pub async fn delete(&self, id: RoleId) -> Result<(), RepositoryError> {
        let is_system = sqlx::query_scalar::<_, bool>("SELECT is_system FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if is_system {
            return Err(RepositoryError::Conflict(
                "System roles cannot be deleted".to_owned(),
            ));
        }

        sqlx::query("DELETE FROM roles WHERE id = $1 AND NOT is_system")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

async fn replace_permissions(
    tx: &mut Transaction<'_, Postgres>,
    role_id: RoleId,
    permissions: &[String],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id)
         SELECT $1, p FROM UNNEST($2::text[]) AS t(p)
         ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .bind(permissions)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
