/// Request-scoped identity resolution
///
/// Turns a bearer token into the authenticated user, or fails. This is the
/// sole gate in front of every protected operation: the token must decode,
/// must not be revoked, and the embedded user must still exist and be
/// active.

use sqlx::PgPool;

use super::token::{TokenError, TokenKeys};
use crate::models::user::User;

/// Error type for identity resolution
///
/// The variants stay distinct so the HTTP boundary can log the real cause,
/// but they all map to a 401-class response without leaking internals.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Token failed signature, expiry, or revocation checks
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Token was valid but the embedded user is gone or inactive
    #[error("User no longer exists or is inactive")]
    UnknownUser,

    /// User lookup failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolves the authenticated user behind a bearer token
///
/// Validates the token (signature, expiry, blacklist) and loads the user by
/// the embedded ID. Soft-deleted and deactivated accounts do not resolve.
pub async fn resolve_current_user(
    pool: &PgPool,
    keys: &TokenKeys,
    token: &str,
) -> Result<User, IdentityError> {
    let claims = keys.validate(pool, token).await?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or(IdentityError::UnknownUser)?;

    Ok(user)
}
