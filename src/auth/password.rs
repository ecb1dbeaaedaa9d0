/// Password Hashing and Verification
///
/// Passwords are hashed with bcrypt. The encoded hash carries its own cost
/// and salt, so verification needs nothing but the stored string.
///
/// bcrypt only reads the first 72 bytes of its input. Every password is
/// first reduced to the hex SHA-256 digest of its bytes (64 bytes), so
/// passwords of any length are hashed in full.

use actix_web::web;
use bcrypt::{hash, verify, DEFAULT_COST};
use sha2::{Digest, Sha256};

use crate::error::{AppError, AuthError, CryptoError};

fn prehash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Hash a password using bcrypt with a fresh random salt
///
/// Any input is accepted, including the empty string.
///
/// # Errors
/// Returns `CryptoError::HashingFailure` if bcrypt cannot produce a hash
/// (salt generation or an out-of-range cost).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Same as [`hash_password`] with an explicit work factor
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(prehash(password), cost).map_err(|e| CryptoError::HashingFailure(e.to_string()).into())
}

/// Verify a password against its stored hash
///
/// The comparison inside bcrypt runs in constant time. A wrong password and
/// an unreadable hash both come back as `AuthError::InvalidCredentials`.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AppError> {
    match verify(prehash(password), hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials.into()),
        Err(e) => {
            tracing::debug!("Stored password hash could not be used: {}", e);
            Err(AuthError::InvalidCredentials.into())
        }
    }
}

/// [`hash_password_with_cost`] on the blocking thread pool
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    web::block(move || hash_password_with_cost(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<(), AppError> {
    web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the suite fast
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hash_password_with_cost(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_default_cost_round_trip() {
        let hash = hash_password("04234").expect("Failed to hash password");
        assert!(verify_password("04234", &hash).is_ok());
    }

    #[test]
    fn test_verify_password() {
        let password = "ValidPassword123";
        let hash = hash_password_with_cost(password, TEST_COST).expect("Failed to hash password");

        assert!(verify_password(password, &hash).is_ok());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password_with_cost("ValidPassword123", TEST_COST)
            .expect("Failed to hash password");

        let result = verify_password("WrongPassword123", &hash);
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidCredentials))));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password_with_cost("repeat", TEST_COST).unwrap();
        let second = hash_password_with_cost("repeat", TEST_COST).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("repeat", &first).is_ok());
        assert!(verify_password("repeat", &second).is_ok());
    }

    #[test]
    fn test_empty_password_is_hashable() {
        let hash = hash_password_with_cost("", TEST_COST).expect("Empty password must hash");

        assert!(verify_password("", &hash).is_ok());
        assert!(verify_password(" ", &hash).is_err());
    }

    #[test]
    fn test_passwords_beyond_72_bytes_are_compared_in_full() {
        let shared_prefix = "a".repeat(72);
        let first = format!("{}first-secret", shared_prefix);
        let second = format!("{}COMPLETELY-DIFFERENT", shared_prefix);

        let hash = hash_password_with_cost(&first, TEST_COST).expect("Failed to hash password");

        assert!(verify_password(&first, &hash).is_ok());
        assert!(matches!(
            verify_password(&second, &hash),
            Err(AppError::Auth(AuthError::InvalidCredentials))
        ));
        assert!(verify_password(&shared_prefix, &hash).is_err());
    }

    #[test]
    fn test_long_multibyte_password_round_trip() {
        let password = "パスワード".repeat(20);
        let hash = hash_password_with_cost(&password, TEST_COST).expect("Failed to hash password");

        assert!(verify_password(&password, &hash).is_ok());
        assert!(verify_password(&"パスワード".repeat(19), &hash).is_err());
    }

    #[test]
    fn test_malformed_hash_looks_like_wrong_password() {
        let result = verify_password("anything", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidCredentials))));
    }

    #[test]
    fn test_invalid_cost_is_a_hashing_failure() {
        let result = hash_password_with_cost("password", 99);
        assert!(matches!(result, Err(AppError::Crypto(CryptoError::HashingFailure(_)))));
    }

    #[actix_web::test]
    async fn test_blocking_variants_round_trip() {
        let hash = hash_password_blocking("off-thread".to_string(), TEST_COST)
            .await
            .expect("Failed to hash password");

        assert!(verify_password_blocking("off-thread".to_string(), hash.clone())
            .await
            .is_ok());
        assert!(matches!(
            verify_password_blocking("on-thread".to_string(), hash).await,
            Err(AppError::Auth(AuthError::InvalidCredentials))
        ));
    }
}
