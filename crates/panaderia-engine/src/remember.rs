//! # Remember-Me Tokens
//!
//! Long-lived signed tokens (HS256) that let a client re-establish a
//! session after the in-memory store is gone. The token carries only the
//! user id and expiry; everything else is re-read from the database when it
//! is redeemed, so a disabled account cannot ride an old token back in.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use panaderia_core::{CoreError, CoreResult};

/// Claims inside a remember-me token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RememberClaims {
    /// Employee id.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Issues a remember-me token for a user.
pub fn issue_remember_token(
    secret: &str,
    user_id: &str,
    now: DateTime<Utc>,
    lifetime_days: i64,
) -> CoreResult<String> {
    let claims = RememberClaims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(lifetime_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| CoreError::Credential(e.to_string()))
}

/// Verifies a remember-me token and returns its claims.
///
/// Any failure (bad signature, expired, malformed) collapses into
/// `Unauthenticated`; the caller never learns which.
pub fn verify_remember_token(
    secret: &str,
    token: &str,
    now: DateTime<Utc>,
) -> CoreResult<RememberClaims> {
    // Expiry is checked against the injected clock, not the library's
    // internal wall clock, so lockout tests can time-travel.
    let mut validation = Validation::default();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<RememberClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| CoreError::Unauthenticated)?;

    if data.claims.exp <= now.timestamp() {
        return Err(CoreError::Unauthenticated);
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_roundtrip() {
        let now = Utc::now();
        let token = issue_remember_token(SECRET, "e1", now, 30).unwrap();
        let claims = verify_remember_token(SECRET, &token, now).unwrap();

        assert_eq!(claims.sub, "e1");
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let token = issue_remember_token(SECRET, "e1", now, 30).unwrap();

        let later = now + Duration::days(31);
        assert!(matches!(
            verify_remember_token(SECRET, &token, later),
            Err(CoreError::Unauthenticated)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let token = issue_remember_token(SECRET, "e1", now, 30).unwrap();

        assert!(verify_remember_token("other-secret", &token, now).is_err());
    }
}
