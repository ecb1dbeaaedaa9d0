use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AccountStore, RefreshTokenLedger, RefreshTokenRecord, User};
use crate::auth::hash_token;
use crate::error::{AppError, DatabaseError};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    // keyed by token hash
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// In-process store for tests and database-less development runs
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RefreshTokenLedger for MemoryStore {
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, AppError> {
        let token_hash = hash_token(token);
        let mut state = self.write()?;

        if state.refresh_tokens.contains_key(&token_hash) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh token already recorded".to_string(),
            )
            .into());
        }

        let record = RefreshTokenRecord {
            token_hash: token_hash.clone(),
            user_id,
            created_at: Utc::now(),
            expires_at,
            revoked_at: None,
        };
        state.refresh_tokens.insert(token_hash, record.clone());

        Ok(record)
    }

    async fn lookup(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let token_hash = hash_token(token);
        Ok(self.read()?.refresh_tokens.get(&token_hash).cloned())
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        let token_hash = hash_token(token);
        let mut state = self.write()?;

        if let Some(record) = state.refresh_tokens.get_mut(&token_hash) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(Utc::now());
            }
        }

        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut state = self.write()?;
        let before = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, record| record.user_id != user_id);
        Ok((before - state.refresh_tokens.len()) as u64)
    }

    async fn clear(&self) -> Result<u64, AppError> {
        let mut state = self.write()?;
        let removed = state.refresh_tokens.len() as u64;
        state.refresh_tokens.clear();
        Ok(removed)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let mut state = self.write()?;

        if state.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "email already registered".to_string(),
            )
            .into());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, AppError> {
        let mut state = self.write()?;

        if state.users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "email already registered".to_string(),
            )
            .into());
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete_all_users(&self) -> Result<u64, AppError> {
        let mut state = self.write()?;
        let removed = state.users.len() as u64;
        state.users.clear();
        // Mirrors ON DELETE CASCADE in the Postgres schema
        state.refresh_tokens.clear();
        Ok(removed)
    }
}
