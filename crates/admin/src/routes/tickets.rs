//! Support desk.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::{info, instrument};

use modvault_core::TicketId;
use modvault_core::types::TicketStatus;
use modvault_core::validation::Validate;

use crate::db::{TicketRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    AdminTicket, ReplyInput, TicketDetail, TicketFilter, TicketPage, TicketReply, TicketUpdate,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/support-tickets", get(index))
        .route(
            "/support-tickets/{id}",
            get(show).patch(update).delete(destroy),
        )
        .route("/support-tickets/{id}/replies", post(reply))
}

fn ticket_not_found() -> AppError {
    AppError::NotFound("Ticket".to_owned())
}

/// Keeping the current status is always allowed.
fn check_transition(current: TicketStatus, next: Option<TicketStatus>) -> Result<()> {
    match next {
        Some(next) if next != current && !current.can_transition_to(next) => Err(
            AppError::Conflict(format!("Cannot move a ticket from {current} to {next}")),
        ),
        _ => Ok(()),
    }
}

#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(filter): Query<TicketFilter>,
) -> Result<Json<TicketPage>> {
    admin.require("view_tickets")?;
    Ok(Json(TicketRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip(state, admin))]
async fn show(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<TicketId>,
) -> Result<Json<TicketDetail>> {
    admin.require("view_tickets")?;
    TicketRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(ticket_not_found)
}

#[instrument(skip(state, admin, update))]
async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<TicketId>,
    Json(update): Json<TicketUpdate>,
) -> Result<Json<AdminTicket>> {
    admin.require("manage_tickets")?;

    let tickets = TicketRepository::new(state.pool());
    let current = tickets.status(id).await?;
    check_transition(current, update.status)?;

    if let Some(Some(assignee)) = update.assigned_to {
        UserRepository::new(state.pool())
            .get(assignee)
            .await?
            .ok_or_else(|| AppError::BadRequest("Assignee does not exist".to_owned()))?;
    }

    let ticket = tickets.update(id, &update).await?;
    info!(
        ticket_id = %id,
        by = %admin.0.id,
        from = %current,
        to = %ticket.status,
        "Ticket updated"
    );
    Ok(Json(ticket))
}

#[instrument(skip(state, admin, input))]
async fn reply(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<TicketId>,
    Json(input): Json<ReplyInput>,
) -> Result<(StatusCode, Json<TicketReply>)> {
    admin.require("manage_tickets")?;
    input.validate()?;

    let tickets = TicketRepository::new(state.pool());
    if tickets.status(id).await? == TicketStatus::Closed {
        return Err(AppError::Conflict("Ticket is closed".to_owned()));
    }

    let reply = tickets.add_reply(id, admin.0.id, &input.body).await?;
    info!(ticket_id = %id, by = %admin.0.id, "Staff reply added");
    Ok((StatusCode::CREATED, Json(reply)))
}

#[instrument(skip(state, admin))]
async fn destroy(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<TicketId>,
) -> Result<StatusCode> {
    admin.require("manage_tickets")?;
    if !TicketRepository::new(state.pool()).delete(id).await? {
        return Err(ticket_not_found());
    }
    info!(ticket_id = %id, by = %admin.0.id, "Ticket deleted");
    Ok(StatusCode::NO_CONTENT)
}
