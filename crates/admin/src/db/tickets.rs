//! Support desk queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use modvault_core::types::TicketStatus;
use modvault_core::{TicketId, UserId};

use super::{RepositoryError, like_pattern, page_bounds, search_term};
use crate::models::{AdminTicket, TicketDetail, TicketFilter, TicketPage, TicketReply, TicketUpdate};

pub const PER_PAGE: u32 = 25;

const TICKET_SELECT: &str = "SELECT t.id, t.user_id, u.username, t.title, t.description, \
     t.status, t.priority, t.category, t.assigned_to, a.username AS assignee_username, \
     t.created_at, t.updated_at, t.resolved_at \
     FROM support_tickets t \
     JOIN users u ON u.id = t.user_id \
     LEFT JOIN users a ON a.id = t.assigned_to";

pub struct TicketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Filtered listing, most urgent and then newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &TicketFilter) -> Result<TicketPage, RepositoryError> {
        let (limit, offset) = page_bounds(filter.page, PER_PAGE);

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM support_tickets t WHERE TRUE",
        );
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("{TICKET_SELECT} WHERE TRUE"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY t.priority DESC, t.created_at DESC");
        select.push(" LIMIT ").push_bind(limit);
        select.push(" OFFSET ").push_bind(offset);
        let tickets = select
            .build_query_as::<AdminTicket>()
            .fetch_all(self.pool)
            .await?;

        Ok(TicketPage {
            tickets,
            page: filter.page.unwrap_or(1).max(1),
            per_page: PER_PAGE,
            total,
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TicketId) -> Result<Option<AdminTicket>, RepositoryError> {
        let ticket = sqlx::query_as::<_, AdminTicket>(&format!("{TICKET_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(ticket)
    }

    /// Ticket with its conversation, oldest reply first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: TicketId) -> Result<Option<TicketDetail>, RepositoryError> {
        let Some(ticket) = self.get(id).await? else {
            return Ok(None);
        };
        let replies = sqlx::query_as::<_, TicketReply>(
            "SELECT r.id, r.ticket_id, r.author_id, u.username AS author_username,
                    r.body, r.is_staff, r.created_at
             FROM ticket_replies r
             JOIN users u ON u.id = r.author_id
             WHERE r.ticket_id = $1
             ORDER BY r.created_at, r.id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(Some(TicketDetail { ticket, replies }))
    }

    /// Apply a staff update. Transition rules are checked by the caller;
    /// `resolved_at` is set on entering `resolved` and cleared on reopening.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist.
    pub async fn update(
        &self,
        id: TicketId,
        update: &TicketUpdate,
    ) -> Result<AdminTicket, RepositoryError> {
        let (assign, assignee) = match update.assigned_to {
            Some(assignee) => (true, assignee),
            None => (false, None),
        };

        let updated = sqlx::query_scalar::<_, TicketId>(
            "UPDATE support_tickets
             SET status = COALESCE($2, status),
                 priority = COALESCE($3, priority),
                 category = COALESCE($4, category),
                 assigned_to = CASE WHEN $5 THEN $6 ELSE assigned_to END,
                 resolved_at = CASE
                     WHEN $2 = 'resolved' AND status <> 'resolved' THEN NOW()
                     WHEN $2 = 'open' THEN NULL
                     ELSE resolved_at
                 END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(update.status)
        .bind(update.priority)
        .bind(update.category)
        .bind(assign)
        .bind(assignee)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        self.get(updated).await?.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_reply(
        &self,
        ticket_id: TicketId,
        author_id: UserId,
        body: &str,
    ) -> Result<TicketReply, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let reply = sqlx::query_as::<_, TicketReply>(
            "WITH inserted AS (
                 INSERT INTO ticket_replies (ticket_id, author_id, body, is_staff)
                 VALUES ($1, $2, $3, TRUE)
                 RETURNING id, ticket_id, author_id, body, is_staff, created_at
             )
             SELECT i.id, i.ticket_id, i.author_id, u.username AS author_username,
                    i.body, i.is_staff, i.created_at
             FROM inserted i JOIN users u ON u.id = i.author_id",
        )
        .bind(ticket_id)
        .bind(author_id)
        .bind(body.trim())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE support_tickets SET updated_at = NOW() WHERE id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(reply)
    }

    /// Current status, for transition checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist.
    pub async fn status(&self, id: TicketId) -> Result<TicketStatus, RepositoryError> {
        sqlx::query_scalar::<_, TicketStatus>("SELECT status FROM support_tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: TicketId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM support_tickets WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TicketFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        builder.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(category) = filter.category {
        builder.push(" AND t.category = ").push_bind(category);
    }
    if let Some(assignee) = filter.assigned_to {
        builder.push(" AND t.assigned_to = ").push_bind(assignee);
    }
    if let Some(term) = search_term(filter.search.as_deref()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (t.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
