//! Support tickets filed by the logged-in user.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, instrument};

use modvault_core::validation::{TicketInput, Validate};

use crate::db::TicketRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::SupportTicket;
use crate::state::AppState;

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<SupportTicket>>> {
    let tickets = TicketRepository::new(state.pool()).list_for_user(user.id).await?;
    Ok(Json(tickets))
}

#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<TicketInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    let ticket = TicketRepository::new(state.pool()).create(user.id, &input).await?;
    info!(ticket_id = %ticket.id, priority = ?ticket.priority, "Support ticket opened");
    Ok((StatusCode::CREATED, Json(ticket)))
}
