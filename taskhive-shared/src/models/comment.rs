/// Comment model and database operations
///
/// Comments belong to one task and one author. Soft-deleted comments stay
/// in the table but are excluded from listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Comment record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Comment {
    /// Creates a new comment on a task
    pub async fn create(
        ex: impl PgExecutor<'_>,
        task_id: i64,
        author_id: i64,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, body, created_at, is_deleted
            "#,
        )
        .bind(task_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(ex)
        .await
    }

    /// Lists live comments of a task, oldest first
    pub async fn list_for_task(
        ex: impl PgExecutor<'_>,
        task_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, body, created_at, is_deleted
            FROM comments
            WHERE task_id = $1 AND NOT is_deleted
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(ex)
        .await
    }

    /// Marks a comment as soft-deleted
    pub async fn soft_delete(ex: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE comments SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted")
                .bind(id)
                .execute(ex)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
