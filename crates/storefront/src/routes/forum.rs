//! Community forum.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use modvault_core::validation::{ForumPostInput, ForumThreadInput, Validate};
use modvault_core::{ForumThreadId, UserId};

use crate::db::forum::ReplyOutcome;
use crate::db::{ForumRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{ForumPost, ForumThread, ThreadPage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    pub category: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ThreadView {
    pub thread: ForumThread,
    pub posts: Vec<ForumPost>,
}

async fn ensure_not_banned(state: &AppState, user_id: UserId) -> Result<()> {
    if UserRepository::new(state.pool()).is_banned(user_id).await? {
        return Err(AppError::Forbidden("Your account cannot post".to_owned()));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> Result<Json<ThreadPage>> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let page = ForumRepository::new(state.pool())
        .list_threads(category, query.page)
        .await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<ThreadView>> {
    let (thread, posts) = ForumRepository::new(state.pool())
        .get_thread(ForumThreadId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Thread".to_owned()))?;
    Ok(Json(ThreadView { thread, posts }))
}

#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<ForumThreadInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    ensure_not_banned(&state, user.id).await?;

    let thread = ForumRepository::new(state.pool())
        .create_thread(user.id, &input)
        .await?;
    info!(thread_id = %thread.id, category = %thread.category, "Thread created");
    Ok((StatusCode::CREATED, Json(thread)))
}

#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn reply(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Json(input): Json<ForumPostInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    ensure_not_banned(&state, user.id).await?;

    match ForumRepository::new(state.pool())
        .reply(ForumThreadId::new(id), user.id, &input)
        .await?
    {
        ReplyOutcome::Posted(post) => Ok((StatusCode::CREATED, Json(post))),
        ReplyOutcome::ThreadLocked => Err(AppError::Conflict("This thread is locked".to_owned())),
        ReplyOutcome::ThreadNotFound => Err(AppError::NotFound("Thread".to_owned())),
    }
}
