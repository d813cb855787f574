/// Project endpoints
///
/// # Endpoints
///
/// - `POST /create-project` - Create a project (creator becomes owner)
/// - `POST /projects/:id/invite` - Invite a user by email
/// - `POST /projects/accept-invite` - Accept a pending invitation
/// - `POST /projects/decline-invite` - Decline a pending invitation
/// - `POST /projects/assign-role` - Change a member's role
/// - `DELETE /projects/:id/remove-user/:user_id` - Remove a member
/// - `GET /projects/:id` - Project detail with members and tasks
/// - `DELETE /projects/:id` - Delete the project (owner only)
///
/// Authorization lives in the membership engine and RBAC module; handlers
/// parse, delegate, and record activity.

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use taskhive_shared::auth::rbac;
use taskhive_shared::membership;
use taskhive_shared::models::activity_log::ActivityLog;
use taskhive_shared::models::comment::Comment;
use taskhive_shared::models::membership::{MemberView, Membership, MembershipStatus, Scope};
use taskhive_shared::models::project::Project;
use taskhive_shared::models::role::ROLE_MEMBER;
use taskhive_shared::models::task::{Task, TaskStatus};
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
}

/// Create project response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    pub project_id: i64,
}

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Invitation state response
#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub membership_id: i64,
    pub status: MembershipStatus,
}

/// Accept/decline invite request
#[derive(Debug, Deserialize)]
pub struct InviteAnswerRequest {
    pub project_id: i64,
}

/// Assign role request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub project_id: i64,
    pub user_id: i64,
    pub role_id: i64,
}

/// POST /create-project
pub async fn create_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<CreateProjectResponse>)> {
    req.validate()?;

    let (project, _membership) = membership::create_project(&state.db, &user, &req.name).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "project",
        project.id,
        "created",
        Some(json!({ "name": project.name })),
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            project_id: project.id,
        }),
    ))
}

/// POST /projects/:id/invite
///
/// Invites the user behind `email` with the default `member` role and
/// dispatches a notification. Requires owner/admin standing on the
/// project.
pub async fn invite_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    req.validate()?;

    let invited = membership::invite(
        &state.db,
        &state.token_keys,
        state.notifier.clone(),
        &user,
        Scope::Project(project_id),
        &req.email,
        ROLE_MEMBER,
    )
    .await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "membership",
        invited.id,
        "invited",
        Some(json!({ "scope": "project", "scope_id": project_id })),
    );

    Ok(Json(MembershipResponse {
        membership_id: invited.id,
        status: invited.status,
    }))
}

/// POST /projects/accept-invite
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<InviteAnswerRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let accepted = membership::accept(&state.db, &user, Scope::Project(req.project_id)).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "membership",
        accepted.id,
        "invite_accepted",
        None,
    );

    Ok(Json(MembershipResponse {
        membership_id: accepted.id,
        status: accepted.status,
    }))
}

/// POST /projects/decline-invite
pub async fn decline_invite(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<InviteAnswerRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let declined = membership::decline(&state.db, &user, Scope::Project(req.project_id)).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "membership",
        declined.id,
        "invite_declined",
        None,
    );

    Ok(Json(MembershipResponse {
        membership_id: declined.id,
        status: declined.status,
    }))
}

/// POST /projects/assign-role
///
/// Overwrites the role on the membership of (project, user). Requires
/// owner/admin standing on the project.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let target = Membership::find_live(&state.db, req.user_id, Scope::Project(req.project_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("membership not found".to_string()))?;

    let updated = membership::assign_role(&state.db, &user, target.id, req.role_id).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "membership",
        updated.id,
        "role_assigned",
        Some(json!({ "role_id": req.role_id })),
    );

    Ok(Json(MembershipResponse {
        membership_id: updated.id,
        status: updated.status,
    }))
}

/// DELETE /projects/:id/remove-user/:user_id
pub async fn remove_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<Json<MembershipResponse>> {
    let removed =
        membership::remove_user(&state.db, &user, Scope::Project(project_id), user_id).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "membership",
        removed.id,
        "member_removed",
        None,
    );

    Ok(Json(MembershipResponse {
        membership_id: removed.id,
        status: removed.status,
    }))
}

/// Project summary inside the detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
}

/// Comment inside the detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentDetail {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
}

/// Task with its comments inside the detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskDetail {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub comments: Vec<CommentDetail>,
}

/// Project detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectDetailResponse {
    pub project: ProjectSummary,
    pub members: Vec<MemberView>,
    pub tasks: Vec<TaskDetail>,
}

/// GET /projects/:id
///
/// Full project view: accepted members with role names, live tasks with
/// their comments. Requires ownership or an accepted membership.
pub async fn project_detail(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !rbac::can_view_project(&state.db, user.id, &project).await? {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    let members = Membership::list_accepted(&state.db, Scope::Project(project.id)).await?;

    let tasks = Task::list_for_project(&state.db, project.id).await?;
    let mut task_details = Vec::with_capacity(tasks.len());
    for task in tasks {
        let comments = Comment::list_for_task(&state.db, task.id).await?;
        task_details.push(TaskDetail {
            id: task.id,
            title: task.title,
            status: task.status,
            comments: comments
                .into_iter()
                .map(|c| CommentDetail {
                    id: c.id,
                    body: c.body,
                    author_id: c.author_id,
                })
                .collect(),
        });
    }

    Ok(Json(ProjectDetailResponse {
        project: ProjectSummary {
            id: project.id,
            name: project.name,
            owner_id: project.owner_id,
        },
        members,
        tasks: task_details,
    }))
}

/// DELETE /projects/:id
///
/// Owner only. Hard-deletes the project; teams, memberships, tasks, and
/// comments go with it.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    rbac::require_owner(user.id, &project)?;

    Project::delete(&state.db, project.id).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "project",
        project.id,
        "deleted",
        Some(json!({ "name": project.name })),
    );

    Ok(StatusCode::NO_CONTENT)
}
