/// Access Token Issuance and Validation
///
/// Access tokens are HS256-signed JWTs. They are never stored: a token is
/// valid exactly when its signature checks out against the server secret
/// and the current time sits inside its `iat`..`exp` window, give or take
/// the clock-skew leeway.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::{AppError, AuthError, ConfigError, CryptoError};

/// Seconds of clock drift tolerated between the issuing and validating host
pub const CLOCK_SKEW_LEEWAY_SECS: i64 = 5;

/// Issue a signed access token for `user_id`, valid for `ttl` from now
///
/// # Errors
/// - `ConfigError::MissingRequired` if `secret` is empty
/// - `ConfigError::InvalidValue` if `ttl` is under one second
/// - `CryptoError::SigningFailure` if encoding fails
pub fn generate_access_token(
    user_id: &Uuid,
    secret: &str,
    ttl: Duration,
) -> Result<String, AppError> {
    if secret.is_empty() {
        return Err(ConfigError::MissingRequired("jwt.secret".to_string()).into());
    }
    if ttl.num_seconds() <= 0 {
        return Err(ConfigError::InvalidValue(format!(
            "access token lifetime must be positive, got {}s",
            ttl.num_seconds()
        ))
        .into());
    }

    let claims = Claims::new(*user_id, Utc::now().timestamp(), ttl.num_seconds());

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| CryptoError::SigningFailure(e.to_string()).into())
}

/// Validate an access token and return the user id it was issued for
///
/// Malformed, forged, expired, wrong-issuer and bad-subject tokens all
/// fail with `AuthError::TokenInvalid`; the precise reason is only logged.
///
/// # Errors
/// - `ConfigError::MissingRequired` if `secret` is empty
/// - `AuthError::TokenInvalid` for every rejected token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    if secret.is_empty() {
        return Err(ConfigError::MissingRequired("jwt.secret".to_string()).into());
    }
    if token.is_empty() {
        return Err(AuthError::TokenInvalid.into());
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = CLOCK_SKEW_LEEWAY_SECS as u64;
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })?;

    if claims.is_issued_in_future(Utc::now().timestamp(), CLOCK_SKEW_LEEWAY_SECS) {
        tracing::warn!(iat = claims.iat, "JWT issued in the future");
        return Err(AuthError::TokenInvalid.into());
    }

    claims.user_id()
}
