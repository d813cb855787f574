/// Task model and database operations
///
/// Tasks belong to exactly one team and carry the containing project for
/// direct filtering. A task may reference a parent task, forming a tree of
/// subtasks. Author and assignee nullify when the referenced user row goes
/// away; tasks themselves are soft-deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('new', 'in_progress', 'done', 'overdue');
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
    Overdue,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Overdue => "overdue",
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    /// Containing project
    pub project_id: i64,

    /// Owning team
    pub team_id: i64,

    /// Optional parent task (subtask tree)
    pub parent_task_id: Option<i64>,

    /// Author; nullified if the user row is deleted
    pub author_id: Option<i64>,

    /// Optional assignee
    pub assignee_id: Option<i64>,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub deadline: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Stamped when status reaches `done`
    pub completed_at: Option<DateTime<Utc>>,

    /// Soft-delete flag
    pub is_deleted: bool,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: i64,
    pub team_id: i64,
    pub parent_task_id: Option<i64>,
    pub author_id: i64,
    pub assignee_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

const TASK_COLUMNS: &str = "id, project_id, team_id, parent_task_id, author_id, assignee_id, \
                            title, description, status, deadline, created_at, completed_at, is_deleted";

impl Task {
    /// Creates a new task in `new` status
    pub async fn create(ex: impl PgExecutor<'_>, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, team_id, parent_task_id, author_id, assignee_id,
                               title, description, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.project_id)
        .bind(data.team_id)
        .bind(data.parent_task_id)
        .bind(data.author_id)
        .bind(data.assignee_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.deadline)
        .fetch_one(ex)
        .await
    }

    /// Finds a live (not soft-deleted) task by ID
    pub async fn find_by_id(ex: impl PgExecutor<'_>, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND NOT is_deleted",
        ))
        .bind(id)
        .fetch_optional(ex)
        .await
    }

    /// Updates the status; `completed_at` is stamped when the task reaches
    /// `done` and cleared when it moves away from it
    pub async fn set_status(
        ex: impl PgExecutor<'_>,
        id: i64,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $2,
                completed_at = CASE WHEN $2 = 'done'::task_status THEN NOW() ELSE NULL END
            WHERE id = $1 AND NOT is_deleted
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(ex)
        .await
    }

    /// Marks a task as soft-deleted
    pub async fn soft_delete(ex: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .execute(ex)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists live tasks of a project
    pub async fn list_for_project(
        ex: impl PgExecutor<'_>,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE project_id = $1 AND NOT is_deleted
            ORDER BY created_at ASC
            "#,
        ))
        .bind(project_id)
        .fetch_all(ex)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::New.as_str(), "new");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
        assert_eq!(TaskStatus::Overdue.as_str(), "overdue");
    }

    #[test]
    fn test_task_status_serde_round_trip() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TaskStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }
}
