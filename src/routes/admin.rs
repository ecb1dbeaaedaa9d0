use actix_web::{web, HttpResponse};

use crate::configuration::Platform;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::middleware::RequestId;
use crate::startup::AppState;

/// POST /admin/reset
///
/// Deletes every refresh token and every user. Only available on the
/// `dev` platform; 403 elsewhere.
pub async fn reset(
    request_id: RequestId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("admin_reset").with_request_id(request_id.as_str());

    if state.platform != Platform::Dev {
        return Err(context.record(AuthError::Forbidden.into()));
    }

    let tokens = state.ledger.clear().await.map_err(|e| context.record(e))?;
    let users = state
        .accounts
        .delete_all_users()
        .await
        .map_err(|e| context.record(e))?;

    tracing::warn!(
        request_id = %context.request_id,
        users_removed = users,
        tokens_removed = tokens,
        "Store reset"
    );

    Ok(HttpResponse::NoContent().finish())
}
