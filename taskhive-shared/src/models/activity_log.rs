/// Activity log sink
///
/// An append-only audit trail of domain mutations. The core only writes;
/// reading is left to reporting tools. Recording runs best-effort on a
/// spawned task so a slow or failing insert never delays or fails the
/// request that caused it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgExecutor, PgPool};
use tracing::warn;

/// Activity log record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub action: String,
    pub changes: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Appends one activity record
    pub async fn record(
        ex: impl PgExecutor<'_>,
        user_id: i64,
        entity_type: &str,
        entity_id: i64,
        action: &str,
        changes: Option<JsonValue>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, entity_type, entity_id, action, changes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(entity_type)
        .bind(entity_id)
        .bind(action)
        .bind(changes)
        .execute(ex)
        .await?;

        Ok(())
    }

    /// Appends a record on a detached task; failures are logged, never
    /// propagated
    pub fn record_detached(
        pool: PgPool,
        user_id: i64,
        entity_type: &'static str,
        entity_id: i64,
        action: &'static str,
        changes: Option<JsonValue>,
    ) {
        tokio::spawn(async move {
            if let Err(e) =
                Self::record(&pool, user_id, entity_type, entity_id, action, changes).await
            {
                warn!(
                    entity_type,
                    entity_id, action, "Failed to append activity log entry: {}", e
                );
            }
        });
    }
}
