/// Team endpoints
///
/// # Endpoints
///
/// - `POST /teams/create` - Create a team under a project
/// - `POST /teams/:id/invite` - Invite a user by email
/// - `POST /teams/accept-invite` - Accept a pending invitation
/// - `POST /teams/decline-invite` - Decline a pending invitation
/// - `POST /teams/assign-role` - Change a member's role by membership ID
/// - `DELETE /memberships/:id` - Remove a member by membership ID
///
/// Team-scoped authorization walks the containment edge up to the project:
/// the project owner and project-level admins administer every team.

use crate::{
    app::{AppState, CurrentUser},
    error::ApiResult,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use taskhive_shared::membership;
use taskhive_shared::models::activity_log::ActivityLog;
use taskhive_shared::models::membership::{MembershipStatus, Scope};
use taskhive_shared::models::role::ROLE_MEMBER;
use validator::Validate;

/// Create team request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    pub project_id: i64,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
}

/// Create team response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTeamResponse {
    pub team_id: i64,
}

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Accept/decline invite request
#[derive(Debug, Deserialize)]
pub struct InviteAnswerRequest {
    pub team_id: i64,
}

/// Assign role request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub membership_id: i64,
    pub role_id: i64,
}

/// Membership state response
#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub membership_id: i64,
    pub status: MembershipStatus,
}

/// POST /teams/create
///
/// Creates a team under the given project and auto-enrolls the creator as
/// its owner. Requires owner/admin standing on the project.
pub async fn create_team(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<CreateTeamResponse>)> {
    req.validate()?;

    let (team, _membership) =
        membership::create_team(&state.db, &user, req.project_id, &req.name).await?;

    ActivityLog::record_detached(
        state.db.clone(),
        user.id,
        "team",
        team.id,
        "created",
        Some(json!({ "name": team.name, "project_id": team.project_id })),
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse { team_id: team.id }),
    ))
}

/// POST /teams/:id/invite
pub async fn invite_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(team_id): Path<i64>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    req.validate()?;

    let invited = membership::invite(
        &state.db,
        &state.token_keys,
        state.notifier.clone(),
        &user,
        Scope::Team(team_id),
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
        Some(json!({ "scope": "team", "scope_id": team_id })),
    );

    Ok(Json(MembershipResponse {
        membership_id: invited.id,
        status: invited.status,
    }))
}

/// POST /teams/accept-invite
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<InviteAnswerRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let accepted = membership::accept(&state.db, &user, Scope::Team(req.team_id)).await?;

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

/// POST /teams/decline-invite
pub async fn decline_invite(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<InviteAnswerRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let declined = membership::decline(&state.db, &user, Scope::Team(req.team_id)).await?;

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

/// POST /teams/assign-role
///
/// Requires owner/admin standing on the enclosing scope; for a team
/// membership that means the containing project's owner or an admin.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let updated =
        membership::assign_role(&state.db, &user, req.membership_id, req.role_id).await?;

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

/// DELETE /memberships/:id
///
/// Marks the membership removed. Removing it again returns 404: the live
/// row is gone.
pub async fn remove_membership(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(membership_id): Path<i64>,
) -> ApiResult<Json<MembershipResponse>> {
    let removed = membership::remove_membership(&state.db, &user, membership_id).await?;

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
