//! Database operations for the storefront.
//!
//! The storefront and admin binaries share one `PostgreSQL` database. Schema
//! lives in `migrations/` at the workspace root and is applied with:
//!
//! ```bash
//! cargo run -p modvault-cli -- migrate
//! ```
//!
//! ## Tables used here
//!
//! - `users` - Accounts and login tracking
//! - `mods` - Catalog
//! - `cart_items` - One row per mod in a user's cart
//! - `orders`, `purchases` - Completed payments and owned mods
//! - `subscription_tiers`, `subscriptions` - Premium access
//! - `mod_downloads` - Download log
//! - `forum_threads`, `forum_posts` - Community forum
//! - `support_tickets` - User-filed tickets
//! - `tower_sessions.session` - Session storage (created by the session store)

pub mod cart;
pub mod forum;
pub mod mods;
pub mod orders;
pub mod subscriptions;
pub mod tickets;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use forum::ForumRepository;
pub use mods::ModRepository;
pub use orders::OrderRepository;
pub use subscriptions::SubscriptionRepository;
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

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
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
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Page size and offset for a 1-based page number.
pub(crate) fn page_bounds(page: Option<u32>, per_page: u32) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    (i64::from(per_page), i64::from(page - 1) * i64::from(per_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, 20), (20, 0));
        assert_eq!(page_bounds(Some(0), 20), (20, 0));
        assert_eq!(page_bounds(Some(3), 24), (24, 48));
    }
}
