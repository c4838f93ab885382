//! Forum threads and posts.

use sqlx::{PgPool, Postgres, QueryBuilder};

use modvault_core::validation::{ForumPostInput, ForumThreadInput};
use modvault_core::{ForumThreadId, UserId};

use super::{RepositoryError, page_bounds};
use crate::models::{ForumPost, ForumThread, ThreadPage};

/// Threads per listing page.
pub const THREADS_PER_PAGE: u32 = 20;

const THREAD_SELECT: &str = "SELECT t.id, t.author_id, u.username AS author_name, t.category, \
     t.title, t.is_locked, t.is_pinned, t.reply_count, t.last_post_at, t.created_at \
     FROM forum_threads t JOIN users u ON u.id = t.author_id";

const POST_SELECT: &str = "SELECT p.id, p.thread_id, p.author_id, u.username AS author_name, \
     p.body, p.created_at \
     FROM forum_posts p JOIN users u ON u.id = p.author_id";

/// Outcome of replying to a thread.
#[derive(Debug)]
pub enum ReplyOutcome {
    Posted(ForumPost),
    ThreadLocked,
    ThreadNotFound,
}

pub struct ForumRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ForumRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Threads, pinned first then most recently active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_threads(
        &self,
        category: Option<&str>,
        page: Option<u32>,
    ) -> Result<ThreadPage, RepositoryError> {
        let (limit, offset) = page_bounds(page, THREADS_PER_PAGE);

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM forum_threads t WHERE TRUE");
        let mut select = QueryBuilder::<Postgres>::new(format!("{THREAD_SELECT} WHERE TRUE"));
        if let Some(category) = category {
            count.push(" AND t.category = ").push_bind(category.to_owned());
            select.push(" AND t.category = ").push_bind(category.to_owned());
        }
        select.push(" ORDER BY t.is_pinned DESC, t.last_post_at DESC");
        select.push(" LIMIT ").push_bind(limit);
        select.push(" OFFSET ").push_bind(offset);

        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        let threads = select.build_query_as::<ForumThread>().fetch_all(self.pool).await?;

        Ok(ThreadPage {
            threads,
            page: page.unwrap_or(1).max(1),
            per_page: THREADS_PER_PAGE,
            total,
        })
    }

    /// A thread and all of its posts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_thread(
        &self,
        id: ForumThreadId,
    ) -> Result<Option<(ForumThread, Vec<ForumPost>)>, RepositoryError> {
        let thread = sqlx::query_as::<_, ForumThread>(&format!("{THREAD_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        let Some(thread) = thread else {
            return Ok(None);
        };

        let posts = sqlx::query_as::<_, ForumPost>(&format!(
            "{POST_SELECT} WHERE p.thread_id = $1 ORDER BY p.created_at, p.id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some((thread, posts)))
    }

    /// Start a thread; its body becomes the first post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create_thread(
        &self,
        author: UserId,
        input: &ForumThreadInput,
    ) -> Result<ForumThread, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ForumThreadId = sqlx::query_scalar(
            "INSERT INTO forum_threads (author_id, category, title)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(author)
        .bind(&input.category)
        .bind(input.title.trim())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO forum_posts (thread_id, author_id, body) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(author)
            .bind(input.body.trim())
            .execute(&mut *tx)
            .await?;

        let thread = sqlx::query_as::<_, ForumThread>(&format!("{THREAD_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(thread)
    }

    /// Reply to a thread unless it is locked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn reply(
        &self,
        thread_id: ForumThreadId,
        author: UserId,
        input: &ForumPostInput,
    ) -> Result<ReplyOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<bool> =
            sqlx::query_scalar("SELECT is_locked FROM forum_threads WHERE id = $1 FOR UPDATE")
                .bind(thread_id)
                .fetch_optional(&mut *tx)
                .await?;

        match locked {
            None => return Ok(ReplyOutcome::ThreadNotFound),
            Some(true) => return Ok(ReplyOutcome::ThreadLocked),
            Some(false) => {}
        }

        let post_id: i32 = sqlx::query_scalar(
            "INSERT INTO forum_posts (thread_id, author_id, body) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(thread_id)
        .bind(author)
        .bind(input.body.trim())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE forum_threads
             SET reply_count = reply_count + 1, last_post_at = NOW()
             WHERE id = $1",
        )
        .bind(thread_id)
        .execute(&mut *tx)
        .await?;

        let post = sqlx::query_as::<_, ForumPost>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ReplyOutcome::Posted(post))
    }
}
