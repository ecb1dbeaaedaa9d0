/// Access Token Extractor
///
/// Handlers that take an `AuthenticatedUser` argument only run for requests
/// carrying a valid access token in `Authorization: Bearer <token>`.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::{extract_bearer_token, validate_access_token};
use crate::error::AppError;
use crate::startup::AppState;

/// The user an inbound access token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }

    fn from_http_request(req: &HttpRequest) -> Result<Self, AppError> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| AppError::Internal("application state not registered".to_string()))?;

        let token = extract_bearer_token(req.headers())?;
        let user_id = validate_access_token(&token, state.jwt.signing_secret()?)?;

        tracing::debug!(user_id = %user_id, "Access token validated");
        Ok(Self(user_id))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}
