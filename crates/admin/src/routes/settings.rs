//! Site settings.

use axum::{Json, Router, extract::State, routing::get};
use tracing::{info, instrument};

use modvault_core::validation::{SiteSettings, Validate};

use crate::db::settings;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(show).put(update))
}

#[instrument(skip_all)]
async fn show(State(state): State<AppState>, admin: RequireAdmin) -> Result<Json<SiteSettings>> {
    admin.require("view_settings")?;
    Ok(Json(settings::site_settings(state.pool()).await?))
}

/// Replace the whole document. Omitted fields reset to their defaults.
#[instrument(skip_all)]
async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<SiteSettings>,
) -> Result<Json<SiteSettings>> {
    admin.require("manage_system")?;
    input.validate()?;

    settings::save_site_settings(state.pool(), &input, admin.0.id).await?;
    info!(
        by = %admin.0.id,
        maintenance_mode = input.maintenance_mode,
        "Site settings saved"
    );
    Ok(Json(input))
}
