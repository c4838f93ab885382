//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use modvault_core::{Email, UserId};

/// A storefront account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub is_admin: bool,
    pub is_premium: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

/// Where a login came from, recorded on the user row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginContext {
    pub ip: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
}
