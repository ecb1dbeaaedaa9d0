/// User Account Routes
///
/// Registration and credential updates. Responses never include the
/// password hash.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::hash_password_blocking;
use crate::error::{AppError, ErrorContext};
use crate::middleware::{AuthenticatedUser, RequestId};
use crate::startup::AppState;
use crate::store::User;
use crate::validators::is_valid_email;

/// Body of `POST /api/users` and `PUT /api/users`
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email
/// - 409: Email already registered
/// - 500: Hashing or storage failure
pub async fn create_user(
    request_id: RequestId,
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration").with_request_id(request_id.as_str());
    let CredentialsRequest { email, password } = form.into_inner();

    let email = is_valid_email(&email).map_err(|e| context.record(e.into()))?;
    let hashed_password = hash_password_blocking(password, state.password_hash_cost)
        .await
        .map_err(|e| context.record(e))?;

    let user = state
        .accounts
        .create_user(&email, &hashed_password)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// PUT /api/users
///
/// Replaces the authenticated user's email and password. Existing refresh
/// tokens stay valid.
///
/// # Errors
/// - 401: Missing or invalid access token
/// - 400: Invalid email
/// - 409: Email taken by another user
pub async fn update_user(
    request_id: RequestId,
    user: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update")
        .with_request_id(request_id.as_str())
        .with_user_id(user.id());
    let CredentialsRequest { email, password } = form.into_inner();

    let email = is_valid_email(&email).map_err(|e| context.record(e.into()))?;
    let hashed_password = hash_password_blocking(password, state.password_hash_cost)
        .await
        .map_err(|e| context.record(e))?;

    let updated = state
        .accounts
        .update_user(user.id(), &email, &hashed_password)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %updated.id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(UserResponse::from(&updated)))
}
