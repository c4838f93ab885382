//! Support tickets from the staff side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use modvault_core::types::{TicketCategory, TicketPriority, TicketStatus};
use modvault_core::validation::{Validate, ValidationErrors, Validator};
use modvault_core::{TicketId, TicketReplyId, UserId};

/// A ticket with the names of its author and assignee.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminTicket {
    pub id: TicketId,
    pub user_id: UserId,
    pub username: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub assigned_to: Option<UserId>,
    pub assignee_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TicketReply {
    pub id: TicketReplyId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub author_username: String,
    pub body: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: AdminTicket,
    pub replies: Vec<TicketReply>,
}

/// Query string for `GET /api/admin/support-tickets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<TicketCategory>,
    /// Matches title or description.
    pub search: Option<String>,
    pub assigned_to: Option<UserId>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketPage {
    pub tickets: Vec<AdminTicket>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// `PATCH /api/admin/support-tickets/{id}`.
///
/// `assigned_to: null` unassigns; leaving the field out keeps the assignee.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<TicketCategory>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub assigned_to: Option<Option<UserId>>,
}

/// Staff reply body.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyInput {
    pub body: String,
}

impl Validate for ReplyInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("body", self.body.trim(), 1, 5000)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_unassign_from_absent() {
        let absent: TicketUpdate = serde_json::from_str(r#"{"status":"in_progress"}"#).unwrap();
        assert_eq!(absent.status, Some(TicketStatus::InProgress));
        assert_eq!(absent.assigned_to, None);

        let unassign: TicketUpdate = serde_json::from_str(r#"{"assigned_to":null}"#).unwrap();
        assert_eq!(unassign.assigned_to, Some(None));

        let assign: TicketUpdate = serde_json::from_str(r#"{"assigned_to":12}"#).unwrap();
        assert_eq!(assign.assigned_to, Some(Some(UserId::new(12))));
    }

    #[test]
    fn test_blank_reply_rejected() {
        let reply = ReplyInput { body: "   ".into() };
        assert!(reply.validate().unwrap_err().has("body"));
        assert!(ReplyInput { body: "Refund issued.".into() }.validate().is_ok());
    }
}
