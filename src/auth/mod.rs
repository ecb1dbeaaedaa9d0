/// Authentication module
///
/// Password hashing, access-token issuance/validation, refresh-token
/// generation, bearer extraction and the session flows built on them.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use bearer::extract_bearer_token;
pub use claims::{Claims, ISSUER};
pub use jwt::{generate_access_token, validate_access_token, CLOCK_SKEW_LEEWAY_SECS};
pub use password::{
    hash_password, hash_password_blocking, hash_password_with_cost, verify_password,
    verify_password_blocking,
};
pub use refresh_token::{generate_refresh_token, hash_token, REFRESH_TOKEN_LEN};
pub use session::{end_session, refresh_session, start_session, SessionTokens};
