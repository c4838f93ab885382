//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown email. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("this account has been suspended")]
    Banned,

    /// Valid account without `is_admin` or any role.
    #[error("this account has no back-office access")]
    NotAnAdmin,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}
