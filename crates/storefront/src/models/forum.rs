//! Forum threads and posts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use modvault_core::{ForumPostId, ForumThreadId, UserId};

/// A thread as shown in listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ForumThread {
    pub id: ForumThreadId,
    pub author_id: UserId,
    pub author_name: String,
    pub category: String,
    pub title: String,
    pub is_locked: bool,
    pub is_pinned: bool,
    pub reply_count: i32,
    pub last_post_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ForumPost {
    pub id: ForumPostId,
    pub thread_id: ForumThreadId,
    pub author_id: UserId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadPage {
    pub threads: Vec<ForumThread>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}
