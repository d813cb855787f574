/// Role-based access checks
///
/// All authorization questions funnel through here instead of being
/// re-implemented as ad-hoc joins at each endpoint. Two facts decide every
/// check:
///
/// 1. **Ownership**: the project owner is always implicitly authorized for
///    anything inside the project, role or no role.
/// 2. **Roles**: an accepted membership whose role name is in the allowed
///    set authorizes the action on that scope.
///
/// Checks combine the two with logical OR. Team-scoped checks walk the
/// containment edge (team -> project) first, so a project owner or
/// project-level admin administers every team inside it.

use sqlx::PgPool;

use crate::models::membership::Scope;
use crate::models::project::Project;
use crate::models::team::Team;

/// Role names that administer a scope
pub const ADMIN_ROLES: &[&str] = &["owner", "admin"];

/// Error type for access checks
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Caller lacks ownership and any allowed role
    #[error("Not authorized to perform this action")]
    Forbidden,

    /// The scope being checked does not exist
    #[error("Scope not found")]
    ScopeNotFound,

    /// Membership lookup failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks whether the user holds one of the allowed roles on a scope
///
/// Only `accepted` memberships count; a pending invitation grants nothing.
pub async fn has_role(
    pool: &PgPool,
    user_id: i64,
    scope: Scope,
    allowed: &[&str],
) -> Result<bool, sqlx::Error> {
    let names: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();

    sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1
            FROM memberships m
            JOIN roles r ON r.id = m.role_id
            WHERE m.user_id = $1 AND m.scope = $2 AND m.scope_id = $3
              AND m.status = 'accepted' AND r.name = ANY($4)
        )
        "#,
    )
    .bind(user_id)
    .bind(scope.kind())
    .bind(scope.id())
    .bind(names)
    .fetch_one(pool)
    .await
}

/// Direct ownership check against the project record
pub fn is_owner(user_id: i64, project: &Project) -> bool {
    project.owner_id == user_id
}

/// Checks whether the user may administer a scope
///
/// - Project scope: project owner, or owner/admin role on the project.
/// - Team scope: walks team -> project, then project owner, owner/admin
///   role on the project, or owner/admin role on the team itself.
///
/// Fails with `ScopeNotFound` if the scope row is missing.
pub async fn can_administer(
    pool: &PgPool,
    user_id: i64,
    scope: Scope,
) -> Result<bool, AccessError> {
    match scope {
        Scope::Project(project_id) => {
            let project = Project::find_by_id(pool, project_id)
                .await?
                .ok_or(AccessError::ScopeNotFound)?;

            Ok(is_owner(user_id, &project)
                || has_role(pool, user_id, scope, ADMIN_ROLES).await?)
        }
        Scope::Team(team_id) => {
            let team = Team::find_by_id(pool, team_id)
                .await?
                .ok_or(AccessError::ScopeNotFound)?;
            let project = Project::find_by_id(pool, team.project_id)
                .await?
                .ok_or(AccessError::ScopeNotFound)?;

            if is_owner(user_id, &project) {
                return Ok(true);
            }
            if has_role(pool, user_id, Scope::Project(project.id), ADMIN_ROLES).await? {
                return Ok(true);
            }
            has_role(pool, user_id, scope, ADMIN_ROLES)
                .await
                .map_err(Into::into)
        }
    }
}

/// Guard form of [`can_administer`]: `Forbidden` unless authorized
pub async fn require_administer(
    pool: &PgPool,
    user_id: i64,
    scope: Scope,
) -> Result<(), AccessError> {
    if can_administer(pool, user_id, scope).await? {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

/// Checks whether the user holds an accepted membership on a scope,
/// regardless of role
pub async fn is_member(pool: &PgPool, user_id: i64, scope: Scope) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM memberships
            WHERE user_id = $1 AND scope = $2 AND scope_id = $3
              AND status = 'accepted'
        )
        "#,
    )
    .bind(user_id)
    .bind(scope.kind())
    .bind(scope.id())
    .fetch_one(pool)
    .await
}

/// Checks whether the user may view a project: owner, or any accepted
/// membership on it
pub async fn can_view_project(
    pool: &PgPool,
    user_id: i64,
    project: &Project,
) -> Result<bool, sqlx::Error> {
    if is_owner(user_id, project) {
        return Ok(true);
    }

    is_member(pool, user_id, Scope::Project(project.id)).await
}

/// Guard: `Forbidden` unless the user owns the project
pub fn require_owner(user_id: i64, project: &Project) -> Result<(), AccessError> {
    if is_owner(user_id, project) {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(owner_id: i64) -> Project {
        Project {
            id: 1,
            name: "p".to_string(),
            owner_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_owner() {
        assert!(is_owner(5, &project(5)));
        assert!(!is_owner(6, &project(5)));
    }

    #[test]
    fn test_require_owner() {
        assert!(require_owner(5, &project(5)).is_ok());
        assert!(matches!(
            require_owner(6, &project(5)),
            Err(AccessError::Forbidden)
        ));
    }

    #[test]
    fn test_admin_roles_cover_owner_and_admin() {
        assert!(ADMIN_ROLES.contains(&"owner"));
        assert!(ADMIN_ROLES.contains(&"admin"));
        assert!(!ADMIN_ROLES.contains(&"member"));
    }
}
