//! Back-office sign-in.
//!
//! Admins are ordinary accounts from the `users` table. Entry requires the
//! `is_admin` flag or at least one role. The effective permission set is
//! resolved at login and again on every request by [`RequireAdmin`], so bans
//! and role changes apply to live sessions.
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use modvault_core::{Email, UserId};
use modvault_core::permissions::UserPermissions;

use crate::db::UserRepository;
use crate::db::users::AccessRecord;
use crate::models::CurrentAdmin;

#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginInput {
    pub email: String,
    pub password: String,
}

pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check credentials and back-office access.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a bad email or password,
    /// `AuthError::Banned` for suspended accounts and `AuthError::NotAnAdmin`
    /// when the account holds neither the admin flag nor a role.
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: &AdminLoginInput) -> Result<CurrentAdmin, AuthError> {
        let email = Email::parse(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let candidate = self
            .users
            .find_for_login(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&input.password, &candidate.password_hash)?;

        if candidate.is_banned {
            warn!(user_id = %candidate.id, "Banned account attempted admin login");
            return Err(AuthError::Banned);
        }

        let admin = self.refresh(candidate.id).await?;
        self.users.touch_login(admin.id).await?;
        info!(user_id = %admin.id, is_admin = admin.access.is_admin, "Admin logged in");
        Ok(admin)
    }

    /// Re-read flags and roles for an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Banned` for suspended accounts and
    /// `AuthError::NotAnAdmin` if the account is gone or lost its access.
    pub async fn refresh(&self, id: UserId) -> Result<CurrentAdmin, AuthError> {
        let record = self.users.access(id).await?.ok_or(AuthError::NotAnAdmin)?;
        admin_from_record(record)
    }
}

fn admin_from_record(record: AccessRecord) -> Result<CurrentAdmin, AuthError> {
    if record.is_banned {
        return Err(AuthError::Banned);
    }
    let access = if record.is_admin {
        UserPermissions::admin()
    } else if record.role_count == 0 {
        return Err(AuthError::NotAnAdmin);
    } else {
        UserPermissions::new(record.permissions)
    };

    Ok(CurrentAdmin {
        id: record.id,
        username: record.username,
        email: record.email,
        access,
    })
}

/// Verify a password against a PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    use super::*;

    fn record(is_admin: bool, is_banned: bool, permissions: &[&str]) -> AccessRecord {
        AccessRecord {
            id: UserId::new(5),
            username: "pit_crew".into(),
            email: Email::parse("crew@modvault.gg").unwrap(),
            is_admin,
            is_banned,
            role_count: i64::from(!permissions.is_empty()),
            permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    #[test]
    fn test_banned_account_loses_access() {
        assert!(matches!(
            admin_from_record(record(true, true, &[])),
            Err(AuthError::Banned)
        ));
    }

    #[test]
    fn test_account_without_roles_is_not_an_admin() {
        assert!(matches!(
            admin_from_record(record(false, false, &[])),
            Err(AuthError::NotAnAdmin)
        ));
    }

    #[test]
    fn test_role_permissions_become_access() {
        let access = record(false, false, &["view_tickets", "view_mods"]);
        let admin = admin_from_record(access).unwrap();
        assert!(!admin.access.is_admin);
        assert!(admin.can("view_tickets"));
        assert!(!admin.can("manage_system"));

        let root = admin_from_record(record(true, false, &[])).unwrap();
        assert!(root.can("manage_system"));
    }

    #[test]
    fn test_verify_password() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"correct horse battery", &salt)
            .unwrap()
            .to_string();

        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_password("anything", "plaintext"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
