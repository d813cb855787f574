/// Membership model and database operations
///
/// A membership ties one user to one scope (a project or a team) with
/// exactly one role and a lifecycle status. The same relation backs both
/// scopes; `scope` discriminates and `scope_id` points at the owning row.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_scope AS ENUM ('project', 'team');
/// CREATE TYPE membership_status AS ENUM ('invited', 'accepted', 'declined', 'removed');
///
/// CREATE TABLE memberships (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     scope membership_scope NOT NULL,
///     scope_id BIGINT NOT NULL,
///     role_id BIGINT NOT NULL REFERENCES roles(id),
///     status membership_status NOT NULL DEFAULT 'invited',
///     invited_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     invited_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     joined_at TIMESTAMPTZ,
///     left_at TIMESTAMPTZ
/// );
/// ```
///
/// A partial unique index on `(user_id, scope, scope_id) WHERE status <>
/// 'removed'` enforces the at-most-one-live-membership invariant in the
/// store itself, backstopping concurrent invites.
///
/// # Lifecycle
///
/// ```text
/// invited ──accept──> accepted ──remove──> removed
///    │                    ▲
///    ├──decline──> declined ── re-invite resets to invited
///    └──remove──> removed
/// ```
///
/// Removal marks the row rather than deleting it, stamping `left_at`.
/// Queries over "live" rows exclude `removed`; `declined` rows stay live so
/// a later invite resets them instead of inserting a duplicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// The two scope kinds memberships attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_scope", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Project,
    Team,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Project => "project",
            ScopeKind::Team => "team",
        }
    }
}

/// A concrete scope: a project or team identified by its row ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Project(i64),
    Team(i64),
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Project(_) => ScopeKind::Project,
            Scope::Team(_) => ScopeKind::Team,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Scope::Project(id) | Scope::Team(id) => *id,
        }
    }
}

/// Membership lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Initial state: invited but not yet responded
    Invited,

    /// Invitation accepted; the member participates in the scope
    Accepted,

    /// Invitation declined; eligible for re-invitation
    Declined,

    /// Removed from the scope; the terminal state
    Removed,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Invited => "invited",
            MembershipStatus::Accepted => "accepted",
            MembershipStatus::Declined => "declined",
            MembershipStatus::Removed => "removed",
        }
    }

    /// Whether this status blocks a fresh invitation
    ///
    /// An invited or accepted membership is in force; inviting over it is
    /// rejected. Declined and removed rows do not block.
    pub fn blocks_invite(&self) -> bool {
        matches!(self, MembershipStatus::Invited | MembershipStatus::Accepted)
    }

    /// Whether an invitation in this status can still be answered
    pub fn awaiting_response(&self) -> bool {
        matches!(self, MembershipStatus::Invited)
    }
}

/// Membership record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Membership ID
    pub id: i64,

    /// Member user
    pub user_id: i64,

    /// Scope kind (project or team)
    pub scope: ScopeKind,

    /// ID of the project or team row
    pub scope_id: i64,

    /// Role held within the scope
    pub role_id: i64,

    /// Lifecycle status
    pub status: MembershipStatus,

    /// Who issued the invitation (None for creator auto-enrollment)
    pub invited_by: Option<i64>,

    /// When the invitation was issued
    pub invited_at: DateTime<Utc>,

    /// When the invitation was accepted (None until then)
    pub joined_at: Option<DateTime<Utc>>,

    /// When the member was removed (None until then)
    pub left_at: Option<DateTime<Utc>>,
}

const MEMBERSHIP_COLUMNS: &str =
    "id, user_id, scope, scope_id, role_id, status, invited_by, invited_at, joined_at, left_at";

impl Membership {
    /// Finds the live (non-removed) membership for a (user, scope) pair
    ///
    /// The partial unique index guarantees at most one such row.
    pub async fn find_live(
        ex: impl PgExecutor<'_>,
        user_id: i64,
        scope: Scope,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM memberships
            WHERE user_id = $1 AND scope = $2 AND scope_id = $3 AND status <> 'removed'
            "#,
        ))
        .bind(user_id)
        .bind(scope.kind())
        .bind(scope.id())
        .fetch_optional(ex)
        .await
    }

    /// Finds a live membership by its row ID
    pub async fn find_live_by_id(
        ex: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM memberships
            WHERE id = $1 AND status <> 'removed'
            "#,
        ))
        .bind(id)
        .fetch_optional(ex)
        .await
    }

    /// Inserts a fresh membership in `invited` status
    pub async fn insert_invited(
        ex: impl PgExecutor<'_>,
        user_id: i64,
        scope: Scope,
        role_id: i64,
        invited_by: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            INSERT INTO memberships (user_id, scope, scope_id, role_id, status, invited_by)
            VALUES ($1, $2, $3, $4, 'invited', $5)
            RETURNING {MEMBERSHIP_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(scope.kind())
        .bind(scope.id())
        .bind(role_id)
        .bind(invited_by)
        .fetch_one(ex)
        .await
    }

    /// Inserts the creator's own membership: `accepted`, `joined_at` stamped
    ///
    /// The only path into `accepted` that skips `invited`.
    pub async fn insert_owner(
        ex: impl PgExecutor<'_>,
        user_id: i64,
        scope: Scope,
        role_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            INSERT INTO memberships (user_id, scope, scope_id, role_id, status, joined_at)
            VALUES ($1, $2, $3, $4, 'accepted', NOW())
            RETURNING {MEMBERSHIP_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(scope.kind())
        .bind(scope.id())
        .bind(role_id)
        .fetch_one(ex)
        .await
    }

    /// Resets a declined membership back to `invited` (re-invitation)
    pub async fn reinvite(
        ex: impl PgExecutor<'_>,
        id: i64,
        role_id: i64,
        invited_by: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET status = 'invited', role_id = $2, invited_by = $3,
                invited_at = NOW(), joined_at = NULL, left_at = NULL
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(role_id)
        .bind(invited_by)
        .fetch_one(ex)
        .await
    }

    /// Transitions `invited` -> `accepted`, stamping `joined_at`
    pub async fn mark_accepted(ex: impl PgExecutor<'_>, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET status = 'accepted', joined_at = NOW()
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_one(ex)
        .await
    }

    /// Transitions `invited` -> `declined`
    pub async fn mark_declined(ex: impl PgExecutor<'_>, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET status = 'declined'
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_one(ex)
        .await
    }

    /// Marks a membership `removed`, stamping `left_at`
    pub async fn mark_removed(ex: impl PgExecutor<'_>, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET status = 'removed', left_at = NOW()
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_one(ex)
        .await
    }

    /// Overwrites the role reference; status is untouched
    pub async fn set_role(
        ex: impl PgExecutor<'_>,
        id: i64,
        role_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET role_id = $2
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(role_id)
        .fetch_one(ex)
        .await
    }

    /// Deletes all memberships attached to a project, including the ones
    /// scoped to its teams
    ///
    /// `scope_id` carries no foreign key, so the row cascade from deleting
    /// the project cannot reach these; call this inside the same
    /// transaction.
    pub async fn delete_for_project(
        ex: impl PgExecutor<'_>,
        project_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM memberships
            WHERE (scope = 'project' AND scope_id = $1)
               OR (scope = 'team' AND scope_id IN (SELECT id FROM teams WHERE project_id = $1))
            "#,
        )
        .bind(project_id)
        .execute(ex)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists accepted members of a scope together with username and role name
    pub async fn list_accepted(pool: &PgPool, scope: Scope) -> Result<Vec<MemberView>, sqlx::Error> {
        sqlx::query_as::<_, MemberView>(
            r#"
            SELECT m.id AS membership_id, u.id AS user_id, u.username, r.name AS role
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            JOIN roles r ON r.id = m.role_id
            WHERE m.scope = $1 AND m.scope_id = $2 AND m.status = 'accepted'
            ORDER BY m.invited_at ASC
            "#,
        )
        .bind(scope.kind())
        .bind(scope.id())
        .fetch_all(pool)
        .await
    }
}

/// Accepted member joined with username and role name, for detail views
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberView {
    pub membership_id: i64,
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_kind_and_id() {
        let scope = Scope::Project(7);
        assert_eq!(scope.kind(), ScopeKind::Project);
        assert_eq!(scope.id(), 7);

        let scope = Scope::Team(42);
        assert_eq!(scope.kind(), ScopeKind::Team);
        assert_eq!(scope.id(), 42);
    }

    #[test]
    fn test_status_blocks_invite() {
        assert!(MembershipStatus::Invited.blocks_invite());
        assert!(MembershipStatus::Accepted.blocks_invite());
        assert!(!MembershipStatus::Declined.blocks_invite());
        assert!(!MembershipStatus::Removed.blocks_invite());
    }

    #[test]
    fn test_status_awaiting_response() {
        assert!(MembershipStatus::Invited.awaiting_response());
        assert!(!MembershipStatus::Accepted.awaiting_response());
        assert!(!MembershipStatus::Declined.awaiting_response());
        assert!(!MembershipStatus::Removed.awaiting_response());
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(MembershipStatus::Invited.as_str(), "invited");
        assert_eq!(MembershipStatus::Accepted.as_str(), "accepted");
        assert_eq!(MembershipStatus::Declined.as_str(), "declined");
        assert_eq!(MembershipStatus::Removed.as_str(), "removed");
    }
}
