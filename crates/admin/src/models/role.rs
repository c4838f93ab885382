//! Roles group catalog permissions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use modvault_core::RoleId;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    /// Seeded roles; they can be edited but not renamed or deleted.
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A role with its permission IDs and how many users hold it.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<String>,
    pub user_count: i64,
}

/// Role name reference, as listed on a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoleRef {
    pub id: RoleId,
    pub name: String,
}
