/// The membership engine
///
/// One state machine governs membership at both scopes (projects and
/// teams): invite, accept, decline, role assignment, and removal, plus the
/// creator auto-enrollment side effect of creating a project or team.
///
/// Every mutation runs inside a single transaction: membership rows, role
/// lookups, and the creator's own accepted membership commit together or
/// not at all. A missing seed role aborts the whole operation with a
/// configuration error; nothing is persisted.
///
/// Authorization is enforced here, not at the endpoints: each operation
/// takes the acting user and applies the ownership-or-admin-role rule via
/// [`crate::auth::rbac`] before touching membership state.
///
/// Invitation notifications go out after commit, fire-and-forget; a
/// delivery failure is logged and never observed by the caller.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;

use crate::auth::rbac::{self, AccessError};
use crate::auth::token::TokenKeys;
use crate::models::membership::{Membership, Scope, ScopeKind};
use crate::models::project::Project;
use crate::models::role::{Role, ROLE_OWNER};
use crate::models::team::Team;
use crate::models::user::User;
use crate::notify::{dispatch_invite, InviteNotifier};

/// Error type for membership operations
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// Caller lacks ownership and any administering role on the scope
    #[error("Not authorized to perform this action")]
    Forbidden,

    /// An invitation or accepted membership is already in force
    #[error("User is already invited or a member of this scope")]
    AlreadyMember,

    /// The membership is not in a state that permits the transition
    #[error("Membership is not in a state that allows this operation")]
    InvalidState,

    /// A referenced entity is missing
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A role the deployment is expected to seed is absent
    ///
    /// This is a setup defect, not a user error; it surfaces as a
    /// server-side failure and is never retried automatically.
    #[error("Required role '{0}' is not seeded in this deployment")]
    SeedRoleMissing(String),

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AccessError> for MembershipError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Forbidden => MembershipError::Forbidden,
            AccessError::ScopeNotFound => MembershipError::NotFound("scope"),
            AccessError::Database(e) => MembershipError::Database(e),
        }
    }
}

fn scope_of(membership: &Membership) -> Scope {
    match membership.scope {
        ScopeKind::Project => Scope::Project(membership.scope_id),
        ScopeKind::Team => Scope::Team(membership.scope_id),
    }
}

/// Creates a project and auto-enrolls the creator
///
/// The creator receives an `accepted` membership with the `owner` role,
/// the only path into membership that skips the `invited` state. Project
/// row, role lookup, and membership insert are one transaction.
pub async fn create_project(
    pool: &PgPool,
    actor: &User,
    name: &str,
) -> Result<(Project, Membership), MembershipError> {
    let mut tx = pool.begin().await?;

    let project = Project::create(&mut *tx, name, actor.id).await?;

    let owner_role = Role::find_by_name(&mut *tx, ROLE_OWNER)
        .await?
        .ok_or_else(|| MembershipError::SeedRoleMissing(ROLE_OWNER.to_string()))?;

    let membership =
        Membership::insert_owner(&mut *tx, actor.id, Scope::Project(project.id), owner_role.id)
            .await?;

    tx.commit().await?;

    Ok((project, membership))
}

/// Creates a team under a project and auto-enrolls the creator
///
/// The actor must administer the containing project. Same atomicity as
/// [`create_project`].
pub async fn create_team(
    pool: &PgPool,
    actor: &User,
    project_id: i64,
    name: &str,
) -> Result<(Team, Membership), MembershipError> {
    rbac::require_administer(pool, actor.id, Scope::Project(project_id)).await?;

    let mut tx = pool.begin().await?;

    let team = Team::create(&mut *tx, project_id, name).await?;

    let owner_role = Role::find_by_name(&mut *tx, ROLE_OWNER)
        .await?
        .ok_or_else(|| MembershipError::SeedRoleMissing(ROLE_OWNER.to_string()))?;

    let membership =
        Membership::insert_owner(&mut *tx, actor.id, Scope::Team(team.id), owner_role.id).await?;

    tx.commit().await?;

    Ok((team, membership))
}

/// Invites a user (by email) to a scope with the given role
///
/// The actor must administer the scope. An invitation or accepted
/// membership already in force fails with `AlreadyMember`; a previously
/// declined membership is reset back to `invited`. After the transaction
/// commits, an invitation notification carrying a freshly issued token is
/// dispatched without blocking the caller.
pub async fn invite(
    pool: &PgPool,
    keys: &TokenKeys,
    notifier: Arc<dyn InviteNotifier>,
    actor: &User,
    scope: Scope,
    invitee_email: &str,
    role_name: &str,
) -> Result<Membership, MembershipError> {
    rbac::require_administer(pool, actor.id, scope).await?;

    let invitee = User::find_by_email(pool, invitee_email)
        .await?
        .ok_or(MembershipError::NotFound("user"))?;

    let mut tx = pool.begin().await?;

    let role = Role::find_by_name(&mut *tx, role_name)
        .await?
        .ok_or_else(|| MembershipError::SeedRoleMissing(role_name.to_string()))?;

    let membership = match Membership::find_live(&mut *tx, invitee.id, scope).await? {
        Some(existing) if existing.status.blocks_invite() => {
            return Err(MembershipError::AlreadyMember);
        }
        Some(declined) => Membership::reinvite(&mut *tx, declined.id, role.id, actor.id).await?,
        None => {
            Membership::insert_invited(&mut *tx, invitee.id, scope, role.id, actor.id)
                .await
                .map_err(|e| match &e {
                    // A concurrent invite won the race; the partial unique
                    // index reports it as a constraint violation.
                    sqlx::Error::Database(db) if db.constraint() == Some("memberships_live_key") => {
                        MembershipError::AlreadyMember
                    }
                    _ => MembershipError::Database(e),
                })?
        }
    };

    tx.commit().await?;

    notify_invitee(pool, keys, notifier, &invitee, scope).await;

    Ok(membership)
}

/// Issues the invitation token and hands delivery off to the notifier
///
/// Best-effort end to end: a token issuance or name lookup failure is
/// logged and the invitation stands without a notification.
async fn notify_invitee(
    pool: &PgPool,
    keys: &TokenKeys,
    notifier: Arc<dyn InviteNotifier>,
    invitee: &User,
    scope: Scope,
) {
    let context_name = match scope_display_name(pool, scope).await {
        Ok(name) => name,
        Err(e) => {
            warn!("Failed to resolve scope name for invitation notification: {}", e);
            return;
        }
    };

    match keys.issue(invitee.id) {
        Ok(token) => dispatch_invite(notifier, invitee.email.clone(), context_name, token),
        Err(e) => warn!("Failed to issue invitation token: {}", e),
    }
}

async fn scope_display_name(pool: &PgPool, scope: Scope) -> Result<String, sqlx::Error> {
    let name = match scope {
        Scope::Project(id) => Project::find_by_id(pool, id).await?.map(|p| p.name),
        Scope::Team(id) => Team::find_by_id(pool, id).await?.map(|t| t.name),
    };

    Ok(name.unwrap_or_else(|| scope.kind().as_str().to_string()))
}

/// Accepts the caller's own pending invitation on a scope
///
/// Only the invited user can accept. No membership for the pair is
/// `NotFound`; anything but `invited` is `InvalidState`. Stamps
/// `joined_at`.
pub async fn accept(
    pool: &PgPool,
    actor: &User,
    scope: Scope,
) -> Result<Membership, MembershipError> {
    let mut tx = pool.begin().await?;

    let membership = Membership::find_live(&mut *tx, actor.id, scope)
        .await?
        .ok_or(MembershipError::NotFound("membership"))?;

    if !membership.status.awaiting_response() {
        return Err(MembershipError::InvalidState);
    }

    let membership = Membership::mark_accepted(&mut *tx, membership.id).await?;

    tx.commit().await?;

    Ok(membership)
}

/// Declines the caller's own pending invitation on a scope
///
/// Same preconditions as [`accept`]. A declined membership can be
/// re-invited later.
pub async fn decline(
    pool: &PgPool,
    actor: &User,
    scope: Scope,
) -> Result<Membership, MembershipError> {
    let mut tx = pool.begin().await?;

    let membership = Membership::find_live(&mut *tx, actor.id, scope)
        .await?
        .ok_or(MembershipError::NotFound("membership"))?;

    if !membership.status.awaiting_response() {
        return Err(MembershipError::InvalidState);
    }

    let membership = Membership::mark_declined(&mut *tx, membership.id).await?;

    tx.commit().await?;

    Ok(membership)
}

/// Overwrites the role on a membership
///
/// The actor must administer the enclosing scope; for team memberships
/// the containment edge is walked up to the project. Status is untouched.
pub async fn assign_role(
    pool: &PgPool,
    actor: &User,
    membership_id: i64,
    role_id: i64,
) -> Result<Membership, MembershipError> {
    let membership = Membership::find_live_by_id(pool, membership_id)
        .await?
        .ok_or(MembershipError::NotFound("membership"))?;

    rbac::require_administer(pool, actor.id, scope_of(&membership)).await?;

    let role = Role::find_by_id(pool, role_id)
        .await?
        .ok_or(MembershipError::NotFound("role"))?;

    Membership::set_role(pool, membership.id, role.id)
        .await
        .map_err(Into::into)
}

/// Removes a member from a scope, addressed by (scope, user)
///
/// The actor must administer the scope. The row is marked `removed` with
/// `left_at` stamped; removing an already-removed member finds no live row
/// and fails with `NotFound` rather than succeeding silently.
pub async fn remove_user(
    pool: &PgPool,
    actor: &User,
    scope: Scope,
    user_id: i64,
) -> Result<Membership, MembershipError> {
    rbac::require_administer(pool, actor.id, scope).await?;

    let membership = Membership::find_live(pool, user_id, scope)
        .await?
        .ok_or(MembershipError::NotFound("membership"))?;

    Membership::mark_removed(pool, membership.id)
        .await
        .map_err(Into::into)
}

/// Removes a member from a scope, addressed by membership ID
pub async fn remove_membership(
    pool: &PgPool,
    actor: &User,
    membership_id: i64,
) -> Result<Membership, MembershipError> {
    let membership = Membership::find_live_by_id(pool, membership_id)
        .await?
        .ok_or(MembershipError::NotFound("membership"))?;

    rbac::require_administer(pool, actor.id, scope_of(&membership)).await?;

    Membership::mark_removed(pool, membership.id)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::membership::MembershipStatus;
    use chrono::Utc;

    fn membership(scope: ScopeKind, scope_id: i64) -> Membership {
        Membership {
            id: 1,
            user_id: 2,
            scope,
            scope_id,
            role_id: 3,
            status: MembershipStatus::Invited,
            invited_by: Some(4),
            invited_at: Utc::now(),
            joined_at: None,
            left_at: None,
        }
    }

    #[test]
    fn test_scope_of() {
        assert_eq!(
            scope_of(&membership(ScopeKind::Project, 9)),
            Scope::Project(9)
        );
        assert_eq!(scope_of(&membership(ScopeKind::Team, 5)), Scope::Team(5));
    }

    #[test]
    fn test_access_error_mapping() {
        assert!(matches!(
            MembershipError::from(AccessError::Forbidden),
            MembershipError::Forbidden
        ));
        assert!(matches!(
            MembershipError::from(AccessError::ScopeNotFound),
            MembershipError::NotFound(_)
        ));
    }

    // The state machine itself is exercised end-to-end in the API
    // integration tests, which have a database to run transactions against.
}
