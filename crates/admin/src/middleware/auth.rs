//! Authentication and authorization extractors for admin.
//!
//! [`RequireAdmin`] proves a back-office session exists and re-reads the
//! account's flags and roles on every request. A banned or demoted admin gets
//! 401 and their session is flushed. Each handler then names the catalog
//! permission it needs:
//!
//! ```rust,ignore
//! async fn list_users(admin: RequireAdmin, ...) -> Result<...> {
//!     admin.require("view_users")?;
//!     ...
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::warn;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};
use crate::services::{AdminAuthService, AuthError};
use crate::state::AppState;

/// Extractor that requires an admin session. Rejects with 401.
pub struct RequireAdmin(pub CurrentAdmin);

impl RequireAdmin {
    /// Fail with 403 unless the admin holds `permission`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` naming the missing permission.
    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        if self.0.can(permission) {
            Ok(())
        } else {
            warn!(user_id = %self.0.id, permission, "Admin permission denied");
            Err(AppError::Forbidden(format!(
                "Missing permission: {permission}"
            )))
        }
    }

    /// Fail with 403 unless the admin carries the `is_admin` flag.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden`.
    pub fn require_flag_admin(&self) -> Result<(), AppError> {
        if self.0.access.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only full administrators can do this".to_owned(),
            ))
        }
    }

    /// Fail with 403 unless the admin already holds every permission being
    /// handed out.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` listing the permissions the admin lacks.
    pub fn require_grantable<'a, I>(&self, permissions: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut missing: Vec<&str> = permissions
            .into_iter()
            .filter(|permission| !self.0.can(permission))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        missing.dedup();
        warn!(user_id = %self.0.id, missing = ?missing, "Admin tried to grant unheld permissions");
        Err(AppError::Forbidden(format!(
            "Cannot grant permissions you do not hold: {}",
            missing.join(", ")
        )))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppError::Unauthorized("Admin sign-in required".to_owned());
        let session_error = |err: tower_sessions::session::Error| {
            AppError::Internal(format!("session error: {err}"))
        };

        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(unauthorized)?;

        let cached: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(unauthorized)?;

        match AdminAuthService::new(state.pool()).refresh(cached.id).await {
            Ok(admin) => {
                if admin != cached {
                    update_current_admin(&session, &admin)
                        .await
                        .map_err(session_error)?;
                }
                Ok(Self(admin))
            }
            Err(err @ (AuthError::Banned | AuthError::NotAnAdmin)) => {
                warn!(user_id = %cached.id, reason = %err, "Admin access revoked, ending session");
                clear_current_admin(&session).await.map_err(session_error)?;
                Err(AppError::Unauthorized("Admin access revoked".to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Store the admin in the session, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Overwrite the stored admin without cycling the id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_admin(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use modvault_core::permissions::UserPermissions;
    use modvault_core::{Email, UserId};

    use super::*;

    fn admin(access: UserPermissions) -> RequireAdmin {
        RequireAdmin(CurrentAdmin {
            id: UserId::new(2),
            username: "mod_team".into(),
            email: Email::parse("team@modvault.gg").unwrap(),
            access,
        })
    }

    #[test]
    fn test_require_checks_permission() {
        let support = admin(UserPermissions::new(["view_tickets"]));
        assert!(support.require("view_tickets").is_ok());

        let err = support.require("manage_system").unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_admin_flag_bypasses() {
        let root = admin(UserPermissions::admin());
        assert!(root.require("manage_system").is_ok());
        assert!(root.require_flag_admin().is_ok());
        assert!(admin(UserPermissions::new(["manage_users"])).require_flag_admin().is_err());
    }

    #[test]
    fn test_cannot_grant_unheld_permissions() {
        let role_manager = admin(UserPermissions::new(["manage_roles", "view_tickets"]));
        assert!(role_manager.require_grantable(["view_tickets"]).is_ok());

        let err = role_manager
            .require_grantable(["view_tickets", "manage_system", "delete_users"])
            .unwrap_err();
        match err {
            AppError::Forbidden(msg) => assert_eq!(
                msg,
                "Cannot grant permissions you do not hold: delete_users, manage_system"
            ),
            other => panic!("unexpected: {other:?}"),
        }

        let root = admin(UserPermissions::admin());
        assert!(root.require_grantable(["manage_system"]).is_ok());
    }
}
