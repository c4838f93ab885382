//! Session-stored admin identity.

use serde::{Deserialize, Serialize};

use modvault_core::permissions::UserPermissions;
use modvault_core::{Email, UserId};

/// The signed-in admin and their effective permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    #[serde(flatten)]
    pub access: UserPermissions,
}

impl CurrentAdmin {
    /// Whether this admin holds `permission`. `is_admin` holds everything.
    #[must_use]
    pub fn can(&self, permission: &str) -> bool {
        self.access.has(permission)
    }
}

/// Session keys.
pub mod keys {
    pub const CURRENT_ADMIN: &str = "current_admin";
}
