//! Support tickets filed by users.

use sqlx::PgPool;

use modvault_core::UserId;
use modvault_core::validation::TicketInput;

use super::RepositoryError;
use crate::models::SupportTicket;

const TICKET_COLUMNS: &str =
    "id, user_id, title, description, status, priority, category, created_at, updated_at";

pub struct TicketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's tickets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SupportTicket>, RepositoryError> {
        let tickets = sqlx::query_as::<_, SupportTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets
             WHERE user_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(tickets)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &TicketInput,
    ) -> Result<SupportTicket, RepositoryError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "INSERT INTO support_tickets (user_id, title, description, category, priority)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(user_id)
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(input.category)
        .bind(input.priority)
        .fetch_one(self.pool)
        .await?;
        Ok(ticket)
    }
}
