//! Password authentication.
//!
//! Passwords are hashed with Argon2id using the crate defaults. Login never
//! reveals whether the email exists.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use modvault_core::Email;
use modvault_core::validation::{Validate, ValidationErrors, Validator};

use crate::db::{RepositoryError, UserRepository};
use crate::models::{LoginContext, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
/// Argon2 gets slow on huge inputs; cap them.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let username = self.username.trim();
        Validator::new()
            .length("username", username, 3, 32)
            .custom("username", || {
                let ok = username
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
                (!ok).then(|| "may only contain letters, digits, '_' and '-'".to_owned())
            })
            .email("email", &self.email)
            .custom("password", || validate_password(&self.password))
            .finish()
    }
}

/// Sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the form is invalid and
    /// `AuthError::UserAlreadyExists` if the email or username is taken.
    #[instrument(skip(self, input), fields(username = %input.username.trim()))]
    pub async fn register(&self, input: &RegisterInput) -> Result<User, AuthError> {
        input.validate()?;
        let email = Email::parse(&input.email)
            .map_err(|e| ValidationErrors::single("email", e.to_string()))?;

        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create(input.username.trim(), &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    /// Log in with email and password, recording where the login came from.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// and `AuthError::Banned` if the account is suspended.
    #[instrument(skip(self, input, context))]
    pub async fn login(
        &self,
        input: &LoginInput,
        context: &LoginContext,
    ) -> Result<User, AuthError> {
        let email = Email::parse(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&input.password, &password_hash)?;

        if user.is_banned {
            return Err(AuthError::Banned);
        }

        self.users.record_login(user.id, context).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }
}

/// Returns the failure message, if any.
fn validate_password(password: &str) -> Option<String> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        Some(format!("must be at least {MIN_PASSWORD_LENGTH} characters"))
    } else if len > MAX_PASSWORD_LENGTH {
        Some(format!("must be at most {MAX_PASSWORD_LENGTH} characters"))
    } else {
        None
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
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
