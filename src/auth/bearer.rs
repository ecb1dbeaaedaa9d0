/// Bearer Credential Extraction
///
/// Reads the raw token out of `Authorization: Bearer <token>`.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::{AppError, AuthError};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer token from request headers
///
/// Fails with `AuthError::MissingToken` when the header is absent, repeated,
/// not valid visible ASCII, lacks the `Bearer ` prefix, or carries nothing
/// after it.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let mut values = headers.get_all(AUTHORIZATION);

    let value = match (values.next(), values.next()) {
        (Some(value), None) => value,
        (None, _) => return Err(AuthError::MissingToken.into()),
        (Some(_), Some(_)) => {
            tracing::debug!("Multiple Authorization headers on request");
            return Err(AuthError::MissingToken.into());
        }
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken.into());
    }

    Ok(token.to_string())
}
