/// Middleware module
///
/// Request logging and the access-token extractor for protected routes.

mod authenticated_user;
mod request_logger;

pub use authenticated_user::AuthenticatedUser;
pub use request_logger::{RequestId, RequestLogger, REQUEST_ID_HEADER};
