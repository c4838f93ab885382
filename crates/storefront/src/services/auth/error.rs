//! Authentication error types.

use thiserror::Error;

use modvault_core::validation::ValidationErrors;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration form failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Wrong password or unknown email. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email or username already registered.
    #[error("an account with that email or username already exists")]
    UserAlreadyExists,

    /// Account is banned.
    #[error("this account has been suspended")]
    Banned,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
