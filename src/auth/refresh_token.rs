/// Refresh Token Generation
///
/// Refresh tokens are 32 bytes from the operating system's secure random
/// source, hex encoded. They carry no identity of their own; the ledger
/// maps them to a user. Only their SHA-256 digest is ever persisted.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, CryptoError};

/// Random bytes drawn per refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Length of the encoded token handed to clients
pub const REFRESH_TOKEN_LEN: usize = REFRESH_TOKEN_BYTES * 2;

/// Generate a new refresh token
///
/// # Errors
/// Returns `CryptoError::EntropyFailure` if the OS random source fails.
/// No token is returned in that case.
pub fn generate_refresh_token() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::EntropyFailure(e.to_string()))?;

    let token = hex::encode(bytes);
    if token.len() != REFRESH_TOKEN_LEN {
        return Err(CryptoError::EntropyFailure(format!(
            "expected {} encoded characters, got {}",
            REFRESH_TOKEN_LEN,
            token.len()
        ))
        .into());
    }

    Ok(token)
}

/// SHA-256 hex digest of a refresh token, the form stored by the ledger
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
