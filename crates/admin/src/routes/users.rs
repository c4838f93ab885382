//! User management.
//!
//! Banning needs `ban_users`, other flag changes need `manage_users`, and only
//! full administrators may grant or revoke the admin flag. Nobody can ban or
//! delete their own account from here, and roles can only be handed out by
//! admins who already hold every permission in them.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::{info, instrument};

use modvault_core::{RoleId, UserId};

use crate::db::{RoleRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    RoleAssignment, RoleRef, UserDetail, UserFilter, UserPage, UserSummary, UserUpdate,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/{id}", get(show).patch(update).delete(destroy))
        .route("/users/{id}/roles", put(set_roles))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User".to_owned())
}

#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(filter): Query<UserFilter>,
) -> Result<Json<UserPage>> {
    admin.require("view_users")?;
    Ok(Json(UserRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip(state, admin))]
async fn show(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetail>> {
    admin.require("view_users")?;
    UserRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

/// Permission and self-protection checks for a flag change.
fn authorize_update(admin: &RequireAdmin, id: UserId, update: &UserUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_owned()));
    }
    if update.is_banned.is_some() {
        admin.require("ban_users")?;
    }
    if update.is_premium.is_some() || update.is_admin.is_some() {
        admin.require("manage_users")?;
    }
    if update.is_admin.is_some() {
        admin.require_flag_admin()?;
    }

    let is_self = admin.0.id == id;
    if is_self && update.is_banned == Some(true) {
        return Err(AppError::BadRequest("You cannot ban yourself".to_owned()));
    }
    if is_self && update.is_admin == Some(false) {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin access".to_owned(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, admin, update))]
async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserSummary>> {
    authorize_update(&admin, id, &update)?;

    let user = UserRepository::new(state.pool())
        .update(id, &update)
        .await?
        .ok_or_else(user_not_found)?;

    info!(
        user_id = %id,
        by = %admin.0.id,
        is_admin = ?update.is_admin,
        is_premium = ?update.is_premium,
        is_banned = ?update.is_banned,
        "User updated"
    );
    Ok(Json(user))
}

#[instrument(skip(state, admin))]
async fn destroy(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    admin.require("delete_users")?;
    if admin.0.id == id {
        return Err(AppError::BadRequest("You cannot delete yourself".to_owned()));
    }

    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(user_not_found());
    }
    info!(user_id = %id, by = %admin.0.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a user's roles. Changing your own roles needs the admin flag.
#[instrument(skip(state, admin, assignment))]
async fn set_roles(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<UserId>,
    Json(assignment): Json<RoleAssignment>,
) -> Result<Json<Vec<RoleRef>>> {
    admin.require("manage_roles")?;
    if admin.0.id == id {
        admin.require_flag_admin()?;
    }

    let users = UserRepository::new(state.pool());
    let held: Vec<RoleId> = users.roles(id).await?.into_iter().map(|r| r.id).collect();
    let added: Vec<RoleId> = assignment
        .role_ids
        .iter()
        .copied()
        .filter(|role_id| !held.contains(role_id))
        .collect();
    if !added.is_empty() {
        let granted = RoleRepository::new(state.pool()).permissions_of(&added).await?;
        admin.require_grantable(granted.iter().map(String::as_str))?;
    }

    let roles = users.set_roles(id, &assignment.role_ids).await?;
    info!(user_id = %id, by = %admin.0.id, roles = roles.len(), "User roles replaced");
    Ok(Json(roles))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use modvault_core::Email;
    use modvault_core::permissions::UserPermissions;

    use super::*;
    use crate::models::CurrentAdmin;

    fn moderator() -> RequireAdmin {
        RequireAdmin(CurrentAdmin {
            id: UserId::new(10),
            username: "moderator".into(),
            email: Email::parse("mod@modvault.gg").unwrap(),
            access: UserPermissions::new(["view_users", "ban_users", "manage_users"]),
        })
    }

    fn ban() -> UserUpdate {
        UserUpdate {
            is_banned: Some(true),
            ..UserUpdate::default()
        }
    }

    #[test]
    fn test_cannot_ban_self() {
        let err = authorize_update(&moderator(), UserId::new(10), &ban()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(authorize_update(&moderator(), UserId::new(11), &ban()).is_ok());
    }

    #[test]
    fn test_admin_flag_needs_full_admin() {
        let promote = UserUpdate {
            is_admin: Some(true),
            ..UserUpdate::default()
        };
        let err = authorize_update(&moderator(), UserId::new(11), &promote).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_ban_requires_ban_permission() {
        let viewer = RequireAdmin(CurrentAdmin {
            access: UserPermissions::new(["view_users"]),
            ..moderator().0
        });
        assert!(matches!(
            authorize_update(&viewer, UserId::new(11), &ban()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(matches!(
            authorize_update(&moderator(), UserId::new(11), &UserUpdate::default()),
            Err(AppError::BadRequest(_))
        ));
    }
}
