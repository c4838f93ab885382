//! Accounts as the back office sees them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use modvault_core::{Email, RoleId, UserId};

use super::RoleRef;

/// A row in the users table view.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub is_admin: bool,
    pub is_premium: bool,
    pub is_banned: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Everything the user detail panel shows, including tracking fields.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserSummary,
    pub last_ip: Option<String>,
    pub last_device: Option<String>,
    pub last_country: Option<String>,
    pub roles: Vec<RoleRef>,
    pub purchase_count: i64,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
    #[default]
    Newest,
    Oldest,
    Username,
    Email,
    LastLogin,
}

impl UserSort {
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::Oldest => "created_at ASC, id ASC",
            Self::Username => "lower(username) ASC, id ASC",
            Self::Email => "lower(email) ASC, id ASC",
            Self::LastLogin => "last_login_at DESC NULLS LAST, id DESC",
        }
    }
}

/// Query string for `GET /api/admin/users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Matches username or email.
    pub search: Option<String>,
    pub admin: Option<bool>,
    pub premium: Option<bool>,
    pub banned: Option<bool>,
    #[serde(default)]
    pub sort: UserSort,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// `PATCH /api/admin/users/{id}`. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub is_admin: Option<bool>,
    pub is_premium: Option<bool>,
    pub is_banned: Option<bool>,
}

impl UserUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.is_admin.is_none() && self.is_premium.is_none() && self.is_banned.is_none()
    }
}

/// `PUT /api/admin/users/{id}/roles` replaces the user's roles.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleAssignment {
    pub role_ids: Vec<RoleId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parses_query_flags() {
        let query = r#"{"search":"drift","banned":true,"sort":"last_login"}"#;
        let filter: UserFilter = serde_json::from_str(query).unwrap();
        assert_eq!(filter.banned, Some(true));
        assert_eq!(filter.admin, None);
        assert_eq!(filter.sort, UserSort::LastLogin);
    }

    #[test]
    fn test_update_emptiness() {
        assert!(UserUpdate::default().is_empty());
        let ban = UserUpdate {
            is_banned: Some(true),
            ..UserUpdate::default()
        };
        assert!(!ban.is_empty());
    }

    #[test]
    fn test_last_login_sort_puts_never_logged_in_last() {
        assert!(UserSort::LastLogin.order_by().contains("NULLS LAST"));
    }
}
