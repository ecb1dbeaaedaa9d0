/// Login, Refresh and Revoke
///
/// Ties the token primitives to the refresh-token ledger. A session is one
/// refresh token: it lives until it expires or is revoked and is not rotated
/// when used.

use chrono::Utc;
use uuid::Uuid;

use crate::auth::jwt::generate_access_token;
use crate::auth::refresh_token::generate_refresh_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};
use crate::store::RefreshTokenLedger;

/// Tokens handed to a client at login
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Open a session for an already authenticated user
///
/// Issues an access token, generates a refresh token and records it in the
/// ledger with an expiry of `jwt.refresh_token_expiry` from now.
pub async fn start_session(
    ledger: &dyn RefreshTokenLedger,
    jwt: &JwtSettings,
    user_id: Uuid,
) -> Result<SessionTokens, AppError> {
    let access_token =
        generate_access_token(&user_id, jwt.signing_secret()?, jwt.access_token_ttl()?)?;
    let expires_at = Utc::now()
        .checked_add_signed(jwt.refresh_token_ttl()?)
        .ok_or_else(|| {
            ConfigError::InvalidValue("jwt.refresh_token_expiry overflows the clock".to_string())
        })?;

    let refresh_token = generate_refresh_token()?;
    ledger.insert(&refresh_token, user_id, expires_at).await?;

    tracing::debug!(user_id = %user_id, expires_at = %expires_at, "Session started");

    Ok(SessionTokens {
        access_token,
        refresh_token,
    })
}

/// Exchange a refresh token for a new access token
///
/// Unknown, expired and revoked refresh tokens all fail with
/// `AuthError::TokenInvalid`.
pub async fn refresh_session(
    ledger: &dyn RefreshTokenLedger,
    jwt: &JwtSettings,
    refresh_token: &str,
) -> Result<String, AppError> {
    let record = match ledger.lookup(refresh_token).await? {
        Some(record) => record,
        None => {
            tracing::warn!("Refresh token not found in ledger");
            return Err(AuthError::TokenInvalid.into());
        }
    };

    if !record.is_usable_at(Utc::now()) {
        if record.is_revoked() {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
        } else {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
        }
        return Err(AuthError::TokenInvalid.into());
    }

    generate_access_token(&record.user_id, jwt.signing_secret()?, jwt.access_token_ttl()?)
}

/// Revoke a refresh token; succeeds whether or not it was ever issued
pub async fn end_session(
    ledger: &dyn RefreshTokenLedger,
    refresh_token: &str,
) -> Result<(), AppError> {
    ledger.revoke(refresh_token).await
}
