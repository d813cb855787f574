/// Team model and database operations
///
/// A team belongs to exactly one project. Team-scoped memberships and
/// tasks attach to it; deleting the project cascades through the team.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Team record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Team ID
    pub id: i64,

    /// Containing project
    pub project_id: i64,

    /// Display name
    pub name: String,

    /// When the team was created
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new team under a project
    pub async fn create(
        ex: impl PgExecutor<'_>,
        project_id: i64,
        name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (project_id, name)
            VALUES ($1, $2)
            RETURNING id, project_id, name, created_at
            "#,
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(ex)
        .await
    }

    /// Finds a team by ID
    pub async fn find_by_id(ex: impl PgExecutor<'_>, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            "SELECT id, project_id, name, created_at FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(ex)
        .await
    }

    /// Lists the teams of a project
    pub async fn list_for_project(
        ex: impl PgExecutor<'_>,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, project_id, name, created_at
            FROM teams
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(ex)
        .await
    }
}
