/// User model and database operations
///
/// Users are the independently-lifetimed identity referenced by projects,
/// memberships, tasks, and comments. Accounts are soft-deleted: uniqueness
/// of username and email only applies to live rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     username TEXT NOT NULL,
///     email TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::user::{CreateUser, User};
/// # use sqlx::PgPool;
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_username(&pool, "alice").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// User record
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Username, unique among live accounts
    pub username: String,

    /// Email address, unique among live accounts
    pub email: String,

    /// Argon2id password hash (PHC string format)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the account may authenticate
    pub is_active: bool,

    /// Soft-delete flag
    pub is_deleted: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Argon2id hash, not the raw password
    pub password_hash: String,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email collides with a live
    /// account (partial unique index) or the database is unreachable.
    pub async fn create(ex: impl PgExecutor<'_>, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, is_active, is_deleted, created_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(ex)
        .await?;

        Ok(user)
    }

    /// Finds a live user by ID
    ///
    /// Soft-deleted accounts are not returned; deactivated accounts are,
    /// so callers can distinguish "gone" from "suspended".
    pub async fn find_by_id(ex: impl PgExecutor<'_>, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, is_deleted, created_at
            FROM users
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id)
        .fetch_optional(ex)
        .await
    }

    /// Finds a live user by username
    pub async fn find_by_username(
        ex: impl PgExecutor<'_>,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, is_deleted, created_at
            FROM users
            WHERE username = $1 AND NOT is_deleted
            "#,
        )
        .bind(username)
        .fetch_optional(ex)
        .await
    }

    /// Finds a live user by email
    pub async fn find_by_email(
        ex: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, is_deleted, created_at
            FROM users
            WHERE email = $1 AND NOT is_deleted
            "#,
        )
        .bind(email)
        .fetch_optional(ex)
        .await
    }

    /// Marks a user as soft-deleted
    ///
    /// Dependent rows are left in place; foreign keys either cascade or
    /// nullify per the schema, and the partial unique indexes free up the
    /// username and email for re-registration.
    pub async fn soft_delete(ex: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .execute(ex)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Public view of a user, safe to return from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}
