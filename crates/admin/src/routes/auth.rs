//! Back-office sign-in.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::{AdminAuthService, AdminLoginInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {err}"))
}

#[instrument(skip(state, session, input))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<AdminLoginInput>,
) -> Result<Json<CurrentAdmin>> {
    let admin = AdminAuthService::new(state.pool()).login(&input).await?;
    set_current_admin(&session, &admin).await.map_err(session_error)?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    Ok(Json(admin))
}

#[instrument(skip(session))]
async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await.map_err(session_error)?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in admin, as re-read by the extractor.
async fn me(RequireAdmin(admin): RequireAdmin) -> Json<CurrentAdmin> {
    Json(admin)
}
