//! Catalog management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use tracing::{info, instrument};

use modvault_core::ModId;
use modvault_core::validation::{ModInput, Validate};

use crate::db::ModRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{AdminMod, ModFilter, ModPage};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mods", get(index).post(create))
        .route("/mods/{id}", get(show).patch(update).delete(destroy))
}

#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(filter): Query<ModFilter>,
) -> Result<Json<ModPage>> {
    admin.require("view_mods")?;
    Ok(Json(ModRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip(state, admin))]
async fn show(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ModId>,
) -> Result<Json<AdminMod>> {
    admin.require("view_mods")?;
    ModRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Mod".to_owned()))
}

#[instrument(skip(state, admin, input))]
async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<ModInput>,
) -> Result<(StatusCode, Json<AdminMod>)> {
    admin.require("manage_mods")?;
    input.validate()?;

    let created = ModRepository::new(state.pool()).create(&input).await?;
    info!(mod_id = %created.id, by = %admin.0.id, "Mod created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, admin, input))]
async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ModId>,
    Json(input): Json<ModInput>,
) -> Result<Json<AdminMod>> {
    admin.require("manage_mods")?;
    input.validate()?;

    let updated = ModRepository::new(state.pool()).update(id, &input).await?;
    info!(mod_id = %id, by = %admin.0.id, "Mod updated");
    Ok(Json(updated))
}

#[instrument(skip(state, admin))]
async fn destroy(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ModId>,
) -> Result<StatusCode> {
    admin.require("manage_mods")?;
    if !ModRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound("Mod".to_owned()));
    }
    info!(mod_id = %id, by = %admin.0.id, "Mod deleted");
    Ok(StatusCode::NO_CONTENT)
}
