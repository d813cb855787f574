/// Project model and database operations
///
/// A project is the top-level collaboration scope. It is owned by exactly
/// one user; ownership is immutable after creation. Teams, tasks, and
/// memberships hang off the project and are deleted with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name TEXT NOT NULL,
///     owner_id BIGINT NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Project ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Owning user; immutable after creation
    pub owner_id: i64,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project
    pub async fn create(
        ex: impl PgExecutor<'_>,
        name: &str,
        owner_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at
            "#,
        )
        .bind(name)
        .bind(owner_id)
        .fetch_one(ex)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id(ex: impl PgExecutor<'_>, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, owner_id, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(ex)
        .await
    }

    /// Hard-deletes a project and everything that depends on it
    ///
    /// Teams, tasks, and comments go with the row cascade; memberships are
    /// cleared explicitly first because their polymorphic `scope_id` carries
    /// no foreign key. Runs in a single transaction.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        super::membership::Membership::delete_for_project(&mut *tx, id).await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
