/// Integration tests for the TaskHive API
///
/// These drive the full router in-process against a real database:
/// registration, login, logout and token revocation, the membership
/// lifecycle at both scopes, role assignment, RBAC enforcement, and the
/// task/comment surface.
///
/// Tests skip (with a notice) when no database is reachable; set
/// DATABASE_URL to run them.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use taskhive_shared::auth::token::TokenKeys;

#[tokio::test]
async fn test_health_is_public() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let (status, body) = ctx.request("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_validates_and_hides_hash() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;

    // The registration response must never carry the hash.
    let (status, body) = ctx
        .request(
            "POST",
            "/register",
            None,
            Some(json!({
                "username": format!("{}-twin", alice.username),
                "email": format!("twin-{}", alice.email),
                "password": "a-perfectly-fine-password",
                "confirm_password": "a-perfectly-fine-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("password_hash").is_none());

    // Password/confirmation mismatch is rejected before hashing.
    let (status, _) = ctx
        .request(
            "POST",
            "/register",
            None,
            Some(json!({
                "username": "mismatched-user",
                "email": "mismatched@example.com",
                "password": "a-perfectly-fine-password",
                "confirm_password": "a-different-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Duplicate username among live accounts is rejected.
    let (status, body) = ctx
        .request(
            "POST",
            "/register",
            None,
            Some(json!({
                "username": alice.username,
                "email": "somebody-else@example.com",
                "password": "a-perfectly-fine-password",
                "confirm_password": "a-perfectly-fine-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");

    // Duplicate email likewise.
    let (status, body) = ctx
        .request(
            "POST",
            "/register",
            None,
            Some(json!({
                "username": format!("{}-other", alice.username),
                "email": alice.email,
                "password": "a-perfectly-fine-password",
                "confirm_password": "a-perfectly-fine-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn test_login_errors_are_indistinguishable() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;

    // Wrong password and unknown username produce the same error kind and
    // message, leaking nothing about which usernames exist.
    let (wrong_status, wrong_body) = ctx
        .request(
            "POST",
            "/login",
            None,
            Some(json!({ "username": alice.username, "password": "not-it" })),
        )
        .await;

    let (unknown_status, unknown_body) = ctx
        .request(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "no-such-user-here", "password": "not-it" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, wrong_status);
    assert_eq!(wrong_body["error"], unknown_body["error"]);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn test_logout_revokes_token_before_expiry() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;

    // The token works.
    let (status, _) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "Before logout" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx.request("POST", "/logout", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Same token, still minutes away from expiry, now refused everywhere.
    let (status, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "After logout" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token revoked");

    // Logging out again with the revoked token also fails authentication;
    // revocation itself stays idempotent at the store level.
    let (status, _) = ctx.request("POST", "/logout", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;

    // Mint a token with the same secret that expired an hour ago.
    let keys = TokenKeys::new(common::TEST_SECRET, 600);
    let stale = keys
        .issue_with_validity(alice.id, Duration::seconds(-3600))
        .unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&stale),
            Some(json!({ "name": "Too late" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let (status, _) = ctx
        .request(
            "POST",
            "/create-project",
            Some("not-a-real-token"),
            Some(json!({ "name": "Nope" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_creator_is_accepted_owner() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "Apollo" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = body["project_id"].as_i64().unwrap();

    // No invite step happened, yet the creator shows up as an accepted
    // member holding the owner role.
    let (status, body) = ctx
        .request(
            "GET",
            &format!("/projects/{}", project_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let members = body["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_id"].as_i64().unwrap(), alice.id);
    assert_eq!(members[0]["role"], "owner");
}

#[tokio::test]
async fn test_team_membership_lifecycle() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;
    let bob = ctx.user_with_token("bob").await;
    let carol = ctx.user_with_token("carol").await;

    // Alice creates a project and a team under it.
    let (_, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "P1" })),
        )
        .await;
    let project_id = body["project_id"].as_i64().unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/teams/create",
            Some(&alice.token),
            Some(json!({ "project_id": project_id, "name": "Backend" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let team_id = body["team_id"].as_i64().unwrap();

    // Alice invites Bob; the membership starts out pending.
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/teams/{}/invite", team_id),
            Some(&alice.token),
            Some(json!({ "email": bob.email })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "invite failed: {}", body);
    assert_eq!(body["status"], "invited");
    let membership_id = body["membership_id"].as_i64().unwrap();

    // Inviting again while the first invitation stands is rejected.
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/teams/{}/invite", team_id),
            Some(&alice.token),
            Some(json!({ "email": bob.email })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only invited/accepted memberships block: an outsider inviting is 403
    // before any state question arises.
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/teams/{}/invite", team_id),
            Some(&carol.token),
            Some(json!({ "email": carol.email })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob accepts; accepting a second time is an invalid transition.
    let (status, body) = ctx
        .request(
            "POST",
            "/teams/accept-invite",
            Some(&bob.token),
            Some(json!({ "team_id": team_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    let (status, _) = ctx
        .request(
            "POST",
            "/teams/accept-invite",
            Some(&bob.token),
            Some(json!({ "team_id": team_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Alice (project owner) promotes Bob to admin.
    let admin_role = ctx.role_id(&alice.token, "admin").await;
    let (status, _) = ctx
        .request(
            "POST",
            "/teams/assign-role",
            Some(&alice.token),
            Some(json!({ "membership_id": membership_id, "role_id": admin_role })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Carol holds nothing on this scope; both mutation paths refuse her.
    let (status, _) = ctx
        .request(
            "POST",
            "/teams/assign-role",
            Some(&carol.token),
            Some(json!({ "membership_id": membership_id, "role_id": admin_role })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/memberships/{}", membership_id),
            Some(&carol.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Alice removes Bob; removing an already-removed membership is 404,
    // not a silent success.
    let (status, body) = ctx
        .request(
            "DELETE",
            &format!("/memberships/{}", membership_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "removed");

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/memberships/{}", membership_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_invite_decline_and_reinvite() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;
    let bob = ctx.user_with_token("bob").await;
    let carol = ctx.user_with_token("carol").await;

    let (_, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "P2" })),
        )
        .await;
    let project_id = body["project_id"].as_i64().unwrap();

    // Invite, decline.
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/projects/{}/invite", project_id),
            Some(&alice.token),
            Some(json!({ "email": bob.email })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .request(
            "POST",
            "/projects/decline-invite",
            Some(&bob.token),
            Some(json!({ "project_id": project_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "declined");

    // A declined membership does not block re-invitation.
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/projects/{}/invite", project_id),
            Some(&alice.token),
            Some(json!({ "email": bob.email })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "invited");

    let (status, _) = ctx
        .request(
            "POST",
            "/projects/accept-invite",
            Some(&bob.token),
            Some(json!({ "project_id": project_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Accepted membership grants read access; outsiders stay locked out.
    let (status, _) = ctx
        .request(
            "GET",
            &format!("/projects/{}", project_id),
            Some(&bob.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request(
            "GET",
            &format!("/projects/{}", project_id),
            Some(&carol.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Inviting an email nobody registered is 404.
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/projects/{}/invite", project_id),
            Some(&alice.token),
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_assign_role_and_remove_user() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;
    let bob = ctx.user_with_token("bob").await;

    let (_, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "P3" })),
        )
        .await;
    let project_id = body["project_id"].as_i64().unwrap();

    ctx.request(
        "POST",
        &format!("/projects/{}/invite", project_id),
        Some(&alice.token),
        Some(json!({ "email": bob.email })),
    )
    .await;
    ctx.request(
        "POST",
        "/projects/accept-invite",
        Some(&bob.token),
        Some(json!({ "project_id": project_id })),
    )
    .await;

    // Role assignment overwrites the role without touching status.
    let admin_role = ctx.role_id(&alice.token, "admin").await;
    let (status, body) = ctx
        .request(
            "POST",
            "/projects/assign-role",
            Some(&alice.token),
            Some(json!({ "project_id": project_id, "user_id": bob.id, "role_id": admin_role })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    // A nonexistent role is 404.
    let (status, _) = ctx
        .request(
            "POST",
            "/projects/assign-role",
            Some(&alice.token),
            Some(json!({ "project_id": project_id, "user_id": bob.id, "role_id": 999999 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Removal by the owner, then the pair has no live membership left.
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/projects/{}/remove-user/{}", project_id, bob.id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/projects/{}/remove-user/{}", project_id, bob.id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_delete_is_owner_only() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;
    let bob = ctx.user_with_token("bob").await;

    let (_, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "Doomed" })),
        )
        .await;
    let project_id = body["project_id"].as_i64().unwrap();

    // Even an accepted member cannot delete; only the owner can.
    ctx.request(
        "POST",
        &format!("/projects/{}/invite", project_id),
        Some(&alice.token),
        Some(json!({ "email": bob.email })),
    )
    .await;
    ctx.request(
        "POST",
        "/projects/accept-invite",
        Some(&bob.token),
        Some(json!({ "project_id": project_id })),
    )
    .await;

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/projects/{}", project_id),
            Some(&bob.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/projects/{}", project_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .request(
            "GET",
            &format!("/projects/{}", project_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_and_comment_flow() {
    let Some(ctx) = common::TestContext::try_new().await else { return };

    let alice = ctx.user_with_token("alice").await;
    let mallory = ctx.user_with_token("mallory").await;

    let (_, body) = ctx
        .request(
            "POST",
            "/create-project",
            Some(&alice.token),
            Some(json!({ "name": "P4" })),
        )
        .await;
    let project_id = body["project_id"].as_i64().unwrap();

    let (_, body) = ctx
        .request(
            "POST",
            "/teams/create",
            Some(&alice.token),
            Some(json!({ "project_id": project_id, "name": "Core" })),
        )
        .await;
    let team_id = body["team_id"].as_i64().unwrap();

    // Non-members cannot create tasks.
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/teams/{}/tasks", team_id),
            Some(&mallory.token),
            Some(json!({ "title": "Sneaky" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/teams/{}/tasks", team_id),
            Some(&alice.token),
            Some(json!({ "title": "Ship it", "description": "The whole thing" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "new");
    assert!(body["completed_at"].is_null());
    let task_id = body["id"].as_i64().unwrap();

    // Moving to done stamps completed_at.
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/tasks/{}/status", task_id),
            Some(&alice.token),
            Some(json!({ "status": "done" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "done");
    assert!(!body["completed_at"].is_null());

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/tasks/{}/comments", task_id),
            Some(&alice.token),
            Some(json!({ "body": "Done and dusted" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // The project detail view stitches tasks and comments together.
    let (_, body) = ctx
        .request(
            "GET",
            &format!("/projects/{}", project_id),
            Some(&alice.token),
            None,
        )
        .await;
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["comments"].as_array().unwrap().len(), 1);

    // Soft-deleted tasks disappear from sight.
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/tasks/{}", task_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/tasks/{}/status", task_id),
            Some(&alice.token),
            Some(json!({ "status": "new" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
