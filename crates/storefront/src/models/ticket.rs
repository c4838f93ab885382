//! Support tickets as seen by their owner.

use chrono::{DateTime, Utc};
use serde::Serialize;

use modvault_core::types::{TicketCategory, TicketPriority, TicketStatus};
use modvault_core::{TicketId, UserId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SupportTicket {
    pub id: TicketId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
