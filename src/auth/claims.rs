/// Access Token Claims
///
/// The payload of an access token: who it is for, who issued it, and the
/// window in which it is valid (RFC 7519 registered claims only).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

/// Issuer label stamped into, and required from, every access token
pub const ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Claims for `user_id`, issued at `issued_at` (Unix seconds) and valid
    /// for `ttl_seconds`
    pub fn new(user_id: Uuid, issued_at: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: issued_at + ttl_seconds,
            iat: issued_at,
            iss: ISSUER.to_string(),
        }
    }

    /// Parse the subject back into a user id
    ///
    /// # Errors
    /// A subject that is not a UUID makes the whole token invalid.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenInvalid.into())
    }

    /// Whether the token claims to be issued further in the future than `leeway`
    pub fn is_issued_in_future(&self, now: i64, leeway: i64) -> bool {
        self.iat > now + leeway
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, 1_000, 3600);

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 4_600);
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, 0, 3600);

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), 0, 3600);
        claims.sub = "invalid-uuid".to_string();

        assert!(matches!(
            claims.user_id(),
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
    }

    #[test]
    fn test_future_issue_time() {
        let claims = Claims::new(Uuid::new_v4(), 200, 10);

        assert!(!claims.is_issued_in_future(195, 5));
        assert!(claims.is_issued_in_future(194, 5));
    }
}
