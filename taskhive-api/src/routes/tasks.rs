/// Task and comment endpoints
///
/// # Endpoints
///
/// - `POST /teams/:id/tasks` - Create a task in a team
/// - `PATCH /tasks/:id/status` - Move a task through its lifecycle
/// - `DELETE /tasks/:id` - Soft-delete a task
/// - `POST /tasks/:id/comments` - Comment on a task
///
/// Participation rule: accepted members of the team (any role) and anyone
/// who administers it may create and update tasks and comments; deleting a
/// task additionally allows its author.

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use taskhive_shared::auth::rbac;
use taskhive_shared::models::activity_log::ActivityLog;
use taskhive_shared::models::comment::Comment;
use taskhive_shared::models::membership::Scope;
use taskhive_shared::models::task::{CreateTask, Task, TaskStatus};
use taskhive_shared::models::team::Team;
use taskhive_shared::models::user::User;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub assignee_id: Option<i64>,

    pub deadline: Option<DateTime<Utc>>,

    /// Optional parent for subtask trees
    pub parent_task_id: Option<i64>,
}

/// Set status request
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: TaskStatus,
}

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "Comment body must not be empty"))]
    pub body: String,
}

/// Accepted team member or scope administrator
async fn require_participant(state: &AppState, user: &User, team_id: i64) -> ApiResult<()> {
    let scope = Scope::Team(team_id);

    if rbac::is_member(&state.db, user.id, scope).await?
        || rbac::can_administer(&state.db, user.id, scope).await?
    {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Not a member of this team".to_string(),
        ))
    }
}

/// POST /teams/:id/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(team_id): Path<i64>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let team = Team::find_by_id(&state.db, team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    require_participant(&state, &user, team.id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: team.project_id,
            team_id: team.id,
            parent_task_id: req.parent_task_id,
            author_id: user.id,
            assignee_id: req.assignee_id,
            title: req.title,
            description: req.description,
            deadline: req.deadline,
        },
    )
    .await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "task",
        task.id,
        "created",
        Some(json!({ "title": task.title, "team_id": team.id })),
    );

    Ok((StatusCode::CREATED, Json(task)))
}

/// PATCH /tasks/:id/status
pub async fn set_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_participant(&state, &user, task.team_id).await?;

    let previous = task.status;
    let updated = Task::set_status(&state.db, task.id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "task",
        updated.id,
        "status_changed",
        Some(json!({ "from": previous.as_str(), "to": updated.status.as_str() })),
    );

    Ok(Json(updated))
}

/// DELETE /tasks/:id
///
/// Soft delete. Allowed for the task's author and anyone administering
/// the team.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let is_author = task.author_id == Some(user.id);
    if !is_author && !rbac::can_administer(&state.db, user.id, Scope::Team(task.team_id)).await? {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this task".to_string(),
        ));
    }

    Task::soft_delete(&state.db, task.id).await?;

    ActivityLog::record_detached(state.db.clone(), user.id, "task", task.id, "deleted", None);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /tasks/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate()?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_participant(&state, &user, task.team_id).await?;

    let comment = Comment::create(&state.db, task.id, user.id, &req.body).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "comment",
        comment.id,
        "created",
        Some(json!({ "task_id": task.id })),
    );

    Ok((StatusCode::CREATED, Json(comment)))
}
