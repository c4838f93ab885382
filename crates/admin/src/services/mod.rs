//! Business logic services for admin.

pub mod auth;

pub use auth::{AdminAuthService, AdminLoginInput, AuthError};
