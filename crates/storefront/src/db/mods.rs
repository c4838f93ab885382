//! Catalog queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use modvault_core::ModId;

use super::{RepositoryError, page_bounds};
use crate::models::{Mod, ModPage, ModQuery};

/// Mods per catalog page.
pub const PER_PAGE: u32 = 24;

const MOD_COLUMNS: &str = "id, title, description, price, discount_price, category, tags, \
     thumbnail_url, version, is_featured, is_subscription_only, download_count, created_at";

pub struct ModRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ModRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &ModQuery) -> Result<ModPage, RepositoryError> {
        let (limit, offset) = page_bounds(query.page, PER_PAGE);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM mods WHERE TRUE");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {MOD_COLUMNS} FROM mods WHERE TRUE"
        ));
        push_filters(&mut select, query);
        select.push(" ORDER BY ").push(query.sort.order_by());
        select.push(" LIMIT ").push_bind(limit);
        select.push(" OFFSET ").push_bind(offset);
        let mods = select.build_query_as::<Mod>().fetch_all(self.pool).await?;

        Ok(ModPage {
            mods,
            page: query.page.unwrap_or(1).max(1),
            per_page: PER_PAGE,
            total,
        })
    }

    /// Get a single mod.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ModId) -> Result<Option<Mod>, RepositoryError> {
        let sql = format!("SELECT {MOD_COLUMNS} FROM mods WHERE id = $1");
        let found = sqlx::query_as::<_, Mod>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(found)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ModQuery) {
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category);
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search.replace('%', "\\%").replace('_', "\\_"));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(tag) = &query.tag {
        builder.push(" AND ").push_bind(tag.clone()).push(" = ANY(tags)");
    }
    if let Some(featured) = query.featured {
        builder.push(" AND is_featured = ").push_bind(featured);
    }
}
