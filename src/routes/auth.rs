/// Authentication Routes
///
/// Login, access-token refresh and refresh-token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    end_session, extract_bearer_token, refresh_session, start_session, verify_password_blocking,
};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::middleware::RequestId;
use crate::routes::UserResponse;
use crate::startup::AppState;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the user plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: Unknown email or wrong password (indistinguishable)
/// - 500: Token signing, entropy or storage failure
pub async fn login(
    request_id: RequestId,
    form: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login").with_request_id(request_id.as_str());
    let LoginRequest { email, password } = form.into_inner();

    let found = state
        .accounts
        .find_by_email(email.trim())
        .await
        .map_err(|e| context.record(e))?;

    // Unknown emails still pay for one bcrypt verification
    let stored_hash = match &found {
        Some(user) => user.hashed_password.clone(),
        None => state.dummy_password_hash.clone(),
    };
    let verified = verify_password_blocking(password, stored_hash).await;

    let user = match (found, verified) {
        (Some(user), Ok(())) => user,
        (None, _) => return Err(context.record(AuthError::InvalidCredentials.into())),
        (Some(_), Err(e)) => return Err(context.record(e)),
    };

    let tokens = start_session(state.ledger.as_ref(), &state.jwt, user.id)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(&user),
        token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Expects `Authorization: Bearer <refresh token>`. The refresh token is
/// not rotated.
///
/// # Errors
/// - 401: Missing, unknown, expired or revoked refresh token
pub async fn refresh(
    request_id: RequestId,
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh").with_request_id(request_id.as_str());

    let refresh_token = extract_bearer_token(req.headers()).map_err(|e| context.record(e))?;
    let token = refresh_session(state.ledger.as_ref(), &state.jwt, &refresh_token)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(request_id = %context.request_id, "Access token refreshed");

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Expects `Authorization: Bearer <refresh token>`. Answers 204 whether or
/// not the token was ever issued.
///
/// # Errors
/// - 401: No bearer credential on the request
pub async fn revoke(
    request_id: RequestId,
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke").with_request_id(request_id.as_str());

    let refresh_token = extract_bearer_token(req.headers()).map_err(|e| context.record(e))?;
    end_session(state.ledger.as_ref(), &refresh_token)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(request_id = %context.request_id, "Refresh token revoked");

    Ok(HttpResponse::NoContent().finish())
}
