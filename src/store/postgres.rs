use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ResetToken, TokenState, TokenStore, TokenStoreError};

/// Postgres-backed token store.
///
/// Invalidation is a conditional UPDATE so the `Active` to `Inactive`
/// transition is decided by the database, not by read-modify-write.
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TokenRow {
    id: Uuid,
    user_id: Uuid,
    key: String,
    state: String,
    created_at: DateTime<Utc>,
}

impl From<TokenRow> for ResetToken {
    fn from(row: TokenRow) -> Self {
        let state = if row.state == "active" {
            TokenState::Active
        } else {
            TokenState::Inactive
        };
        Self {
            id: row.id,
            user_id: row.user_id,
            key: row.key,
            state,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn create(&self, user_id: Uuid) -> Result<ResetToken, TokenStoreError> {
        let token = ResetToken::issue(user_id);

        sqlx::query(
            "INSERT INTO reset_tokens (id, user_id, key, state, created_at)
             VALUES ($1, $2, $3, 'active', $4)",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.key)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Persistence(e.to_string()))?;

        Ok(token)
    }

    async fn get_by_key(&self, key: &str) -> Result<ResetToken, TokenStoreError> {
        let row: Option<TokenRow> = sqlx::query_as(
            "SELECT id, user_id, key, state, created_at
             FROM reset_tokens
             WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Persistence(e.to_string()))?;

        row.map(ResetToken::from).ok_or(TokenStoreError::NotFound)
    }

    async fn invalidate(&self, key: &str) -> Result<bool, TokenStoreError> {
        let result = sqlx::query(
            "UPDATE reset_tokens
             SET state = 'inactive'
             WHERE key = $1 AND state = 'active'",
        )
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Persistence(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
