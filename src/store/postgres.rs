use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, RefreshTokenLedger, RefreshTokenRecord, User};
use crate::auth::hash_token;
use crate::error::{AppError, DatabaseError};

type UserRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);
type RefreshTokenRow = (String, Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>);

fn user_from_row(row: UserRow) -> User {
    let (id, email, hashed_password, created_at, updated_at) = row;
    User {
        id,
        email,
        hashed_password,
        created_at,
        updated_at,
    }
}

fn record_from_row(row: RefreshTokenRow) -> RefreshTokenRecord {
    let (token_hash, user_id, created_at, expires_at, revoked_at) = row;
    RefreshTokenRecord {
        token_hash,
        user_id,
        created_at,
        expires_at,
        revoked_at,
    }
}

/// Postgres-backed accounts and refresh-token ledger
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the migrations under `./migrations`
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::UnexpectedError(format!("migration failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenLedger for PgStore {
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $3, $4)
            RETURNING token_hash, user_id, created_at, expires_at, revoked_at
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record_from_row(row))
    }

    async fn lookup(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT token_hash, user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(record_from_row))
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token_hash = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(hash_token(token))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            user_id = %user_id,
            removed = result.rows_affected(),
            "Refresh tokens deleted for user"
        );
        Ok(result.rows_affected())
    }

    async fn clear(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $1, hashed_password = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;

        Ok(user_from_row(row))
    }

    async fn delete_all_users(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::postgres::PgPoolOptions;

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("Failed to connect to Postgres");
        let store = PgStore::new(pool);
        store.migrate().await.expect("Failed to migrate");
        store
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance at DATABASE_URL"]
    async fn test_refresh_token_lifecycle() {
        let store = store().await;
        let email = format!("{}@example.com", Uuid::new_v4());
        let user = store.create_user(&email, "hash").await.unwrap();
        let token = Uuid::new_v4().simple().to_string();

        store
            .insert(&token, user.id, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        let duplicate = store
            .insert(&token, user.id, Utc::now() + Duration::days(1))
            .await;
        assert!(matches!(
            duplicate,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));

        store.revoke(&token).await.unwrap();
        let first = store.lookup(&token).await.unwrap().unwrap().revoked_at;
        store.revoke(&token).await.unwrap();
        let second = store.lookup(&token).await.unwrap().unwrap().revoked_at;
        assert!(first.is_some());
        assert_eq!(first, second);

        assert_eq!(store.delete_all_for_user(user.id).await.unwrap(), 1);
        assert!(store.lookup(&token).await.unwrap().is_none());
    }
}
