//! Catalog editing.
//!
//! No optimistic locking: the last write wins.

use sqlx::{PgPool, Postgres, QueryBuilder};

use modvault_core::ModId;
use modvault_core::types::ModCategory;
use modvault_core::validation::ModInput;

use super::{RepositoryError, like_pattern, page_bounds, search_term};
use crate::models::{AdminMod, ModFilter, ModPage};

pub const PER_PAGE: u32 = 25;

const MOD_COLUMNS: &str = "id, title, description, price, discount_price, category, tags, \
     download_url, thumbnail_url, version, changelog, is_featured, is_subscription_only, \
     download_count, created_at, updated_at";

pub struct ModRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ModRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ModFilter) -> Result<ModPage, RepositoryError> {
        let (limit, offset) = page_bounds(filter.page, PER_PAGE);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM mods WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {MOD_COLUMNS} FROM mods WHERE TRUE"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY updated_at DESC, id DESC");
        select.push(" LIMIT ").push_bind(limit);
        select.push(" OFFSET ").push_bind(offset);
        let mods = select.build_query_as::<AdminMod>().fetch_all(self.pool).await?;

        Ok(ModPage {
            mods,
            page: filter.page.unwrap_or(1).max(1),
            per_page: PER_PAGE,
            total,
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ModId) -> Result<Option<AdminMod>, RepositoryError> {
        let found = sqlx::query_as::<_, AdminMod>(&format!(
            "SELECT {MOD_COLUMNS} FROM mods WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(found)
    }

    /// Insert a validated mod.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the category slug is not
    /// in the catalog (validation should have caught it).
    pub async fn create(&self, input: &ModInput) -> Result<AdminMod, RepositoryError> {
        let category = category_of(input)?;
        let created = sqlx::query_as::<_, AdminMod>(&format!(
            "INSERT INTO mods (title, description, price, discount_price, category, tags,
                               download_url, thumbnail_url, version, changelog,
                               is_featured, is_subscription_only)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {MOD_COLUMNS}"
        ))
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(category)
        .bind(normalized_tags(&input.tags))
        .bind(&input.download_url)
        .bind(input.thumbnail_url.as_deref())
        .bind(input.version.trim())
        .bind(input.changelog.as_deref())
        .bind(input.is_featured)
        .bind(input.is_subscription_only)
        .fetch_one(self.pool)
        .await?;
        Ok(created)
    }

    /// Overwrite every editable field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the mod does not exist.
    pub async fn update(&self, id: ModId, input: &ModInput) -> Result<AdminMod, RepositoryError> {
        let category = category_of(input)?;
        sqlx::query_as::<_, AdminMod>(&format!(
            "UPDATE mods
             SET title = $2, description = $3, price = $4, discount_price = $5,
                 category = $6, tags = $7, download_url = $8, thumbnail_url = $9,
                 version = $10, changelog = $11, is_featured = $12,
                 is_subscription_only = $13, updated_at = NOW()
             WHERE id = $1
             RETURNING {MOD_COLUMNS}"
        ))
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(category)
        .bind(normalized_tags(&input.tags))
        .bind(&input.download_url)
        .bind(input.thumbnail_url.as_deref())
        .bind(input.version.trim())
        .bind(input.changelog.as_deref())
        .bind(input.is_featured)
        .bind(input.is_subscription_only)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Returns whether a row was deleted. Purchases of the mod go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ModId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM mods WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn category_of(input: &ModInput) -> Result<ModCategory, RepositoryError> {
    input.category().ok_or_else(|| {
        RepositoryError::DataCorruption(format!("unknown category {}", input.category))
    })
}

/// Lowercased, trimmed, deduplicated, in first-seen order.
fn normalized_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ModFilter) {
    if let Some(term) = search_term(filter.search.as_deref()) {
        builder.push(" AND title ILIKE ").push_bind(like_pattern(term));
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category);
    }
    if let Some(featured) = filter.featured {
        builder.push(" AND is_featured = ").push_bind(featured);
    }
}
