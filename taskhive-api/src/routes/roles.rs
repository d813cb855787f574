/// Role and permission endpoints
///
/// # Endpoints
///
/// - `POST /roles/create` - Create a role, or extend an existing role's
///   permission set
/// - `GET /roles` - List roles
/// - `GET /permissions` - List permissions
///
/// Roles are deployment-wide records, not scoped to a project; the seed
/// roles (`owner`, `admin`, `member`) come from the migration and the
/// membership engine depends on them being present.

use crate::{
    app::{AppState, CurrentUser},
    error::ApiResult,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskhive_shared::models::activity_log::ActivityLog;
use taskhive_shared::models::role::{Permission, Role};
use validator::Validate;

/// Create role request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,

    pub description: Option<String>,

    /// Permission IDs to grant; additive for an existing role
    #[serde(default)]
    pub permissions: Vec<i64>,
}

/// POST /roles/create
pub async fn create_role(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    req.validate()?;

    let role = Role::create_with_permissions(
        &state.db,
        &req.name,
        req.description.as_deref(),
        &req.permissions,
    )
    .await?;

    ActivityLog::record_detached(state.db.clone(), user.id, "role", role.id, "created", None);

    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /roles
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(Role::list(&state.db).await?))
}

/// GET /permissions
pub async fn list_permissions(State(state): State<AppState>) -> ApiResult<Json<Vec<Permission>>> {
    Ok(Json(Permission::list(&state.db).await?))
}
