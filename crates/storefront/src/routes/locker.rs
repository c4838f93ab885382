//! Owned mods and downloads.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use modvault_core::{ModId, UserId};

use crate::db::{OrderRepository, SubscriptionRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Download, LockerEntry};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Locker {
    pub subscribed: bool,
    pub mods: Vec<LockerEntry>,
}

async fn is_subscribed(state: &AppState, user_id: UserId) -> Result<bool> {
    let now = Utc::now();
    Ok(SubscriptionRepository::new(state.pool())
        .current(user_id)
        .await?
        .is_some_and(|s| s.grants_access(now)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Locker>> {
    let subscribed = is_subscribed(&state, user.id).await?;
    let mods = OrderRepository::new(state.pool())
        .locker(user.id, subscribed)
        .await?;
    Ok(Json(Locker { subscribed, mods }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn download(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(mod_id): Path<i32>,
) -> Result<Json<Download>> {
    let subscribed = is_subscribed(&state, user.id).await?;
    let download = OrderRepository::new(state.pool())
        .download(user.id, ModId::new(mod_id), subscribed)
        .await?
        .ok_or_else(|| AppError::Forbidden("You do not own this mod".to_owned()))?;

    info!(mod_id, version = %download.version, "Mod downloaded");
    Ok(Json(download))
}
