/// Role and permission models
///
/// Roles are named records granted to memberships; permissions are named
/// capabilities granted to roles through a many-to-many link. The
/// migration seeds `owner`, `admin`, and `member` along with a
/// `{action}_{entity}` permission matrix; core operations treat a missing
/// seed role as a deployment defect, not a user error.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id BIGSERIAL PRIMARY KEY,
///     name TEXT NOT NULL UNIQUE,
///     description TEXT
/// );
///
/// CREATE TABLE permissions (
///     id BIGSERIAL PRIMARY KEY,
///     name TEXT NOT NULL UNIQUE,
///     description TEXT
/// );
///
/// CREATE TABLE role_permissions (
///     role_id BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
///     permission_id BIGINT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
///     PRIMARY KEY (role_id, permission_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Seed role held by the creator of a project or team
pub const ROLE_OWNER: &str = "owner";

/// Seed role for scope administrators
pub const ROLE_ADMIN: &str = "admin";

/// Seed role assigned to invited members by default
pub const ROLE_MEMBER: &str = "member";

/// Role record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    /// Role ID
    pub id: i64,

    /// Unique role name
    pub name: String,

    /// Optional human-readable description
    pub description: Option<String>,
}

/// Permission record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    /// Permission ID
    pub id: i64,

    /// Unique capability name, e.g. "update_task"
    pub name: String,

    /// Optional human-readable description
    pub description: Option<String>,
}

impl Role {
    /// Finds a role by name
    pub async fn find_by_name(
        ex: impl PgExecutor<'_>,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(ex)
            .await
    }

    /// Finds a role by ID
    pub async fn find_by_id(ex: impl PgExecutor<'_>, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(ex)
            .await
    }

    /// Lists all roles
    pub async fn list(ex: impl PgExecutor<'_>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY id ASC")
            .fetch_all(ex)
            .await
    }

    /// Creates a role (or finds the existing one) and grants it a set of
    /// permissions
    ///
    /// Granting is additive and idempotent; unknown permission IDs are
    /// ignored by the join insert. Runs in a single transaction.
    pub async fn create_with_permissions(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
        permission_ids: &[i64],
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let role = match Self::find_by_name(&mut *tx, name).await? {
            Some(role) => role,
            None => {
                sqlx::query_as::<_, Role>(
                    r#"
                    INSERT INTO roles (name, description)
                    VALUES ($1, $2)
                    RETURNING id, name, description
                    "#,
                )
                .bind(name)
                .bind(description)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        if !permission_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, p.id FROM permissions p WHERE p.id = ANY($2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role.id)
            .bind(permission_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(role)
    }

    /// Lists the permission names granted to this role
    pub async fn permissions(&self, ex: impl PgExecutor<'_>) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.description
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.id ASC
            "#,
        )
        .bind(self.id)
        .fetch_all(ex)
        .await
    }
}

impl Permission {
    /// Lists all permissions
    pub async fn list(ex: impl PgExecutor<'_>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description FROM permissions ORDER BY id ASC",
        )
        .fetch_all(ex)
        .await
    }
}
