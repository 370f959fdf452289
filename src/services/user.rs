use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{thread_rng, Rng};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Account owner. The password hash never serializes onto the wire.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user store unavailable: {0}")]
    Persistence(String),
}

/// User collaborator contract. Hashing is owned by the implementations; the
/// workflow only ever hands over plaintext and receives the updated record.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<User, UserStoreError>;
    async fn get_by_id(&self, id: Uuid) -> Result<User, UserStoreError>;
    async fn update_password(&self, id: Uuid, new_password: &str) -> Result<User, UserStoreError>;
    async fn verify_password(&self, email: &str, password: &str) -> Result<User, UserStoreError>;
}

/// Salted SHA-256, stored as `salt$digest` hex.
fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    thread_rng().fill(&mut salt);
    let salt_hex: String = salt.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}${}", salt_hex, digest_with_salt(&salt_hex, password))
}

fn verify_hash(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => digest_with_salt(salt, password) == digest,
        None => false,
    }
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// In-memory user store for tests and database-less runs.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account, returning the stored record.
    pub fn insert(&self, email: &str, name: &str, password: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: hash_password(password),
            created_at: Utc::now(),
        };
        self.lock().insert(user.id, user.clone());
        user
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, User>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_email(&self, email: &str) -> Result<User, UserStoreError> {
        self.lock()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(UserStoreError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, UserStoreError> {
        self.lock().get(&id).cloned().ok_or(UserStoreError::NotFound)
    }

    async fn update_password(&self, id: Uuid, new_password: &str) -> Result<User, UserStoreError> {
        let mut users = self.lock();
        let user = users.get_mut(&id).ok_or(UserStoreError::NotFound)?;
        user.password_hash = hash_password(new_password);
        Ok(user.clone())
    }

    async fn verify_password(&self, email: &str, password: &str) -> Result<User, UserStoreError> {
        let user = self.get_by_email(email).await?;
        if verify_hash(password, &user.password_hash) {
            Ok(user)
        } else {
            Err(UserStoreError::InvalidCredentials)
        }
    }
}

/// Postgres-backed user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_email(&self, email: &str) -> Result<User, UserStoreError> {
        let user: Option<User> = sqlx::query_as(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserStoreError::Persistence(e.to_string()))?;

        user.ok_or(UserStoreError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, UserStoreError> {
        let user: Option<User> = sqlx::query_as(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserStoreError::Persistence(e.to_string()))?;

        user.ok_or(UserStoreError::NotFound)
    }

    async fn update_password(&self, id: Uuid, new_password: &str) -> Result<User, UserStoreError> {
        let user: Option<User> = sqlx::query_as(
            "UPDATE users SET password_hash = $2
             WHERE id = $1
             RETURNING id, email, name, password_hash, created_at",
        )
        .bind(id)
        .bind(hash_password(new_password))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserStoreError::Persistence(e.to_string()))?;

        user.ok_or(UserStoreError::NotFound)
    }

    async fn verify_password(&self, email: &str, password: &str) -> Result<User, UserStoreError> {
        let user = self.get_by_email(email).await?;
        if verify_hash(password, &user.password_hash) {
            Ok(user)
        } else {
            Err(UserStoreError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip() {
        let stored = hash_password("secret");
        assert!(verify_hash("secret", &stored));
        assert!(!verify_hash("wrong", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("secret"), hash_password("secret"));
    }

    #[tokio::test]
    async fn test_memory_store_lookup_and_update() {
        let store = MemoryUserStore::new();
        let user = store.insert("a@x.com", "Alice", "old-password");

        let by_email = store.get_by_email("a@x.com").await.unwrap();
        assert_eq!(by_email.id, user.id);

        store.update_password(user.id, "new-password").await.unwrap();
        assert!(store.verify_password("a@x.com", "new-password").await.is_ok());
        assert!(matches!(
            store.verify_password("a@x.com", "old-password").await,
            Err(UserStoreError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_memory_store_unknown_email() {
        let store = MemoryUserStore::new();
        assert!(matches!(
            store.get_by_email("nobody@x.com").await,
            Err(UserStoreError::NotFound)
        ));
    }
}
