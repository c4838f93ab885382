//! Database operations for admin.
//!
//! Admin reads and writes the same `PostgreSQL` database as the storefront.
//! Schema lives in `migrations/` at the workspace root:
//!
//! ```bash
//! cargo run -p modvault-cli -- migrate
//! ```
//!
//! ## Tables used here
//!
//! - `users`, `user_roles` - Accounts and their role assignments
//! - `roles`, `role_permissions` - Roles and the catalog permissions they grant
//! - `mods` - Catalog
//! - `support_tickets`, `ticket_replies` - Support desk
//! - `site_settings` - Site-wide settings (JSONB)
//! - `orders`, `purchases`, `mod_downloads`, `subscriptions` - Read for analytics
//! - `tower_sessions.session` - Session storage (created by the session store)

pub mod analytics;
pub mod mods;
pub mod roles;
pub mod settings;
pub mod tickets;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use mods::ModRepository;
pub use roles::RoleRepository;
pub use tickets::TicketRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique role name).
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Limit and offset for a 1-based page number.
pub(crate) fn page_bounds(page: Option<u32>, per_page: u32) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    (i64::from(per_page), i64::from(page - 1) * i64::from(per_page))
}

/// `%term%` for `ILIKE`, with the wildcards in `term` escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    format!(
        "%{}%",
        term.trim()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    )
}

/// Trimmed, non-empty search term.
pub(crate) fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}
