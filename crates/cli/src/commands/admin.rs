//! Back-office access bootstrap.
//!
//! The first administrator has to come from somewhere: `grant` flips the
//! admin flag on an account that registered through the storefront.

use modvault_admin::db::{RoleRepository, UserRepository};
use modvault_admin::models::UserUpdate;
use modvault_core::Email;
use modvault_core::validation::{RoleInput, Validate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No account with email: {0}")]
    UnknownUser(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

/// Give an existing account the admin flag.
///
/// # Errors
///
/// Returns an error if the email is malformed, no account uses it, or a
/// query fails.
pub async fn grant(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    let candidate = users
        .find_for_login(&email)
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_string()))?;

    if candidate.is_admin {
        tracing::info!("{} is already an admin", candidate.username);
        return Ok(());
    }

    let update = UserUpdate {
        is_admin: Some(true),
        ..UserUpdate::default()
    };
    users.update(candidate.id, &update).await?;

    tracing::info!(user_id = %candidate.id, "Granted admin access to {}", candidate.username);
    if candidate.is_banned {
        tracing::warn!("{} is banned and cannot sign in until unbanned", candidate.username);
    }
    Ok(())
}

/// Create a custom role from the command line.
///
/// # Errors
///
/// Returns an error if the input fails validation (unknown permissions
/// included), the name is taken, or a query fails.
pub async fn create_role(
    name: String,
    description: Option<String>,
    permissions: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = RoleInput {
        name,
        description,
        permissions,
    };
    input
        .validate()
        .map_err(|e| AdminError::InvalidRole(e.to_string()))?;

    let pool = super::connect().await?;
    let role = RoleRepository::new(&pool).create(&input).await?;

    tracing::info!(
        role_id = %role.role.id,
        permissions = role.permissions.len(),
        "Created role {}",
        role.role.name
    );
    Ok(())
}
