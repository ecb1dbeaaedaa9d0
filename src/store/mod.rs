/// Persistence collaborators
///
/// The credential code talks to storage through two narrow traits:
/// `RefreshTokenLedger` for refresh-token state and `AccountStore` for
/// user accounts. `PgStore` backs both with Postgres, `MemoryStore` keeps
/// them in process.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

/// Server-side state of one issued refresh token
///
/// Keyed by the SHA-256 digest of the token; the plaintext is never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Neither revoked nor expired at `now`
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}

/// Refresh-token persistence
///
/// All methods take the plaintext token; implementations hash it before
/// it touches storage.
#[async_trait]
pub trait RefreshTokenLedger: Send + Sync {
    /// Record a newly issued token.
    ///
    /// Fails with `DatabaseError::UniqueConstraintViolation` if the token
    /// is already recorded.
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, AppError>;

    /// Find the record for `token`, `None` if it was never issued
    async fn lookup(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Set `revoked_at` if unset. Revoking an unknown or already revoked
    /// token is not an error.
    async fn revoke(&self, token: &str) -> Result<(), AppError>;

    /// Drop every token owned by `user_id`, returning how many were removed
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError>;

    /// Drop every token. Administrative reset only.
    async fn clear(&self) -> Result<u64, AppError>;
}

/// A registered user as stored; the password hash never leaves the server
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User-account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `DatabaseError::UniqueConstraintViolation` on a taken email
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Replace email and password hash. Unknown id is `DatabaseError::NotFound`.
    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, AppError>;

    async fn delete_all_users(&self) -> Result<u64, AppError>;
}
