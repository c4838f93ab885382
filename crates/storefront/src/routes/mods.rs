//! Public catalog.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use modvault_core::ModId;

use crate::db::ModRepository;
use crate::error::{AppError, Result};
use crate::models::{Mod, ModPage, ModQuery};
use crate::state::AppState;

/// List mods. Results are cached per normalized query for a minute.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ModQuery>,
) -> Result<Json<ModPage>> {
    let key = query.normalized();
    let pool = state.pool().clone();

    let page = state
        .catalog_cache()
        .try_get_with(key.clone(), async move {
            ModRepository::new(&pool).list(&key).await.map(Arc::new)
        })
        .await
        .map_err(|e| AppError::Internal(format!("catalog query failed: {e}")))?;

    Ok(Json(ModPage::clone(&page)))
}

#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Mod>> {
    ModRepository::new(state.pool())
        .get(ModId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Mod".to_owned()))
}
