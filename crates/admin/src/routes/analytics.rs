//! Dashboard numbers.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::db::AnalyticsRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::Analytics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/analytics", get(show))
}

#[instrument(skip_all)]
async fn show(State(state): State<AppState>, admin: RequireAdmin) -> Result<Json<Analytics>> {
    admin.require("view_analytics")?;
    Ok(Json(AnalyticsRepository::new(state.pool()).summary().await?))
}
