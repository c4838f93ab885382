//! Role management.
//!
//! An admin can only put permissions they hold themselves into a role.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::{info, instrument};

use modvault_core::RoleId;
use modvault_core::validation::{RoleInput, Validate};

use crate::db::RoleRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::RoleDetail;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/roles", get(index).post(create))
        .route("/roles/{id}", get(show).patch(update).delete(destroy))
}

#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<Json<Vec<RoleDetail>>> {
    admin.require("view_roles")?;
    Ok(Json(RoleRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state, admin))]
async fn show(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<RoleId>,
) -> Result<Json<RoleDetail>> {
    admin.require("view_roles")?;
    RoleRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Role".to_owned()))
}

#[instrument(skip(state, admin, input))]
async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<RoleInput>,
) -> Result<(StatusCode, Json<RoleDetail>)> {
    admin.require("manage_roles")?;
    input.validate()?;
    admin.require_grantable(input.permissions.iter().map(String::as_str))?;

    let role = RoleRepository::new(state.pool()).create(&input).await?;
    info!(role_id = %role.role.id, by = %admin.0.id, "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

#[instrument(skip(state, admin, input))]
async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<RoleId>,
    Json(input): Json<RoleInput>,
) -> Result<Json<RoleDetail>> {
    admin.require("manage_roles")?;
    input.validate()?;

    let roles = RoleRepository::new(state.pool());
    let current = roles
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role".to_owned()))?;
    admin.require_grantable(added_permissions(&current.permissions, &input.permissions))?;

    let role = roles.update(id, &input).await?;
    info!(role_id = %id, by = %admin.0.id, "Role updated");
    Ok(Json(role))
}

/// Permissions in `requested` that the role does not grant yet.
fn added_permissions<'a>(
    current: &'a [String],
    requested: &'a [String],
) -> impl Iterator<Item = &'a str> {
    requested
        .iter()
        .filter(|permission| !current.contains(permission))
        .map(String::as_str)
}

#[instrument(skip(state, admin))]
async fn destroy(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<RoleId>,
) -> Result<StatusCode> {
    admin.require("manage_roles")?;
    RoleRepository::new(state.pool()).delete(id).await?;
    info!(role_id = %id, by = %admin.0.id, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}
