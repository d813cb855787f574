/// Revoked token store
///
/// Persisted set of token strings that are no longer accepted regardless of
/// signature validity. Entries never expire: tokens have a bounded lifetime,
/// so the table grows only by the logout rate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Blacklisted token record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlacklistedToken {
    /// The exact token string as presented by the client
    pub token: String,

    /// When the token was revoked
    pub created_at: DateTime<Utc>,
}

impl BlacklistedToken {
    /// Inserts a token into the blacklist; idempotent
    pub async fn insert(ex: impl PgExecutor<'_>, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO blacklisted_tokens (token) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(token)
            .execute(ex)
            .await?;

        Ok(())
    }

    /// Checks whether a token has been revoked
    pub async fn contains(ex: impl PgExecutor<'_>, token: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM blacklisted_tokens WHERE token = $1)")
            .bind(token)
            .fetch_one(ex)
            .await
    }
}
