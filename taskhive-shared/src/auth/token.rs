/// Session token service
///
/// Issues HS256-signed tokens with a fixed validity window and validates
/// them on every authenticated request. Validation checks signature and
/// expiry first, then consults the persisted blacklist so a logged-out
/// token is rejected even before it expires naturally.
///
/// The signing keys are built once at startup from configuration and passed
/// around explicitly rather than read from ambient globals, so tests can use
/// deterministic secrets and windows.
///
/// Invitation tokens use the same issuance path and carry just the invited
/// user's id; they share the session token's shape and expiry.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::token::TokenKeys;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new("a-test-secret-of-at-least-32-bytes!", 600);
/// let token = keys.issue(42)?;
/// let claims = keys.decode(&token)?;
/// assert_eq!(claims.sub, 42);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::blacklisted_token::BlacklistedToken;

/// Token issuer baked into every claim set
const ISSUER: &str = "taskhive";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    Creation(String),

    /// Signature or structure invalid
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Past its expiry timestamp
    #[error("Token has expired")]
    Expired,

    /// Present in the revocation blacklist
    #[error("Token has been revoked")]
    Revoked,

    /// Blacklist lookup failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Token claims
///
/// - `sub`: user ID the token authenticates
/// - `iss`: always "taskhive"
/// - `iat`: issued-at (Unix timestamp)
/// - `exp`: expiry (Unix timestamp)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(user_id: i64, validity: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
        }
    }

    /// Checks if the claims are past their expiry
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signing and verification keys plus the validity window
///
/// Built once from process configuration; cheap to clone into shared state.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

impl TokenKeys {
    /// Builds keys from a shared secret and a validity window in seconds
    ///
    /// The secret should be at least 32 bytes; the API config enforces that
    /// at load time.
    pub fn new(secret: &str, validity_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity: Duration::seconds(validity_seconds),
        }
    }

    /// Issues a signed token for a user with the configured validity window
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue_with_validity(user_id, self.validity)
    }

    /// Issues a token with an explicit validity window
    ///
    /// Negative durations produce already-expired tokens, which the tests
    /// rely on.
    pub fn issue_with_validity(
        &self,
        user_id: i64,
        validity: Duration,
    ) -> Result<String, TokenError> {
        let header = Header::new(Algorithm::HS256);
        let claims = Claims::new(user_id, validity);

        encode(&header, &claims, &self.encoding)
            .map_err(|e| TokenError::Creation(format!("Token encoding failed: {}", e)))
    }

    /// Decodes a token, checking signature, structure, issuer, and expiry
    ///
    /// Does not consult the blacklist; use [`TokenKeys::validate`] on
    /// request paths.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;

        let token_data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(format!("Token validation failed: {}", e)),
            })?;

        Ok(token_data.claims)
    }

    /// Full validation: decode, then reject revoked tokens
    ///
    /// Blacklist membership wins over everything else a decoded token has
    /// going for it: a revoked token stays dead until (and past) its
    /// natural expiry.
    pub async fn validate(&self, pool: &PgPool, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;

        if BlacklistedToken::contains(pool, token).await? {
            return Err(TokenError::Revoked);
        }

        Ok(claims)
    }
}

/// Revokes a token by inserting it into the blacklist; idempotent
///
/// Entries have no expiry of their own. Tokens are short-lived, so the
/// table is bounded by the logout rate.
pub async fn revoke(pool: &PgPool, token: &str) -> Result<(), TokenError> {
    BlacklistedToken::insert(pool, token).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_issue_and_decode() {
        let keys = TokenKeys::new(SECRET, 600);

        let token = keys.issue(42).expect("Should create token");
        let claims = keys.decode(&token).expect("Should decode token");

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let keys = TokenKeys::new(SECRET, 600);
        let other = TokenKeys::new("another-secret-key-also-32-bytes-long", 600);

        let token = keys.issue(1).unwrap();
        let result = other.decode(&token);

        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_decode_garbage() {
        let keys = TokenKeys::new(SECRET, 600);

        assert!(matches!(
            keys.decode("not-a-token"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            keys.decode("a.b.c"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_expired() {
        let keys = TokenKeys::new(SECRET, 600);

        // Expired an hour ago, well past the validation leeway.
        let token = keys
            .issue_with_validity(7, Duration::seconds(-3600))
            .unwrap();

        let result = keys.decode(&token);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_claims_is_expired() {
        let live = Claims::new(1, Duration::seconds(600));
        assert!(!live.is_expired());

        let dead = Claims::new(1, Duration::seconds(-10));
        assert!(dead.is_expired());
    }

    // Revocation is exercised in the API integration tests, which have a
    // database to hold the blacklist.
}
