/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /register` - Create a user account
/// - `POST /login` - Verify credentials and issue a session token
/// - `POST /logout` - Revoke the presented token
///
/// Login deliberately reports one error for both "unknown username" and
/// "wrong password" so the response does not reveal which usernames exist.

use crate::{
    app::{AppState, BearerToken, CurrentUser},
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::{password, token};
use taskhive_shared::models::activity_log::ActivityLog;
use taskhive_shared::models::user::{CreateUser, User, UserView};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username, unique among live accounts
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Must match `password`
    pub confirm_password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub access_token: String,
}

/// Logout response
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// POST /register
///
/// Creates a user account. The raw password is hashed with Argon2id and
/// discarded; the response carries the user without the hash.
///
/// # Errors
///
/// - `400`: validation failed, passwords do not match, or the username or
///   email is already taken by a live account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    req.validate()?;

    if req.password != req.confirm_password {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "confirm_password".to_string(),
            message: "Passwords do not match".to_string(),
        }]));
    }

    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::BadRequest("Username already exists".to_string()));
    }

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    ActivityLog::record_detached(state.db.clone(), user.id, "user", user.id, "registered", None);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /login
///
/// Verifies credentials and issues a session token with the configured
/// validity window.
///
/// # Errors
///
/// - `401`: unknown username or wrong password, one indistinguishable
///   error for both
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = User::find_by_username(&state.db, &req.username).await?;

    let verified = match &user {
        Some(user) => password::verify_password(&req.password, &user.password_hash)?,
        None => false,
    };

    let user = match (user, verified) {
        (Some(user), true) => user,
        _ => return Err(ApiError::Unauthorized("Invalid credentials".to_string())),
    };

    let access_token = state.token_keys.issue(user.id)?;

    Ok(Json(LoginResponse { access_token }))
}

/// POST /logout
///
/// Inserts the presented token into the blacklist. Idempotent: logging out
/// twice with the same token succeeds both times, and the token stays dead
/// either way.
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(BearerToken(bearer)): Extension<BearerToken>,
) -> ApiResult<Json<LogoutResponse>> {
    token::revoke(&state.db, &bearer).await?;

    ActivityLog::record_detached(state.db.clone(), user.id, "user", user.id, "logged_out", None);

    Ok(Json(LogoutResponse {
        message: "logged out".to_string(),
    }))
}
