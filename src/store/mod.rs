pub mod memory;
pub mod postgres;

pub use memory::MemoryTokenStore;
pub use postgres::PgTokenStore;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    Active,
    Inactive,
}

/// Single-use, time-bounded secret proving control of a user's registered
/// email. Records are never deleted; a consumed or expired token simply fails
/// `is_valid` forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key: String,
    pub state: TokenState,
    pub created_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn issue(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            key: generate_key(),
            state: TokenState::Active,
            created_at: Utc::now(),
        }
    }

    /// Holds iff the token is still active and the validity window has not
    /// elapsed. The two failure causes are indistinguishable to callers.
    pub fn is_valid(&self, ttl: Duration) -> bool {
        self.state == TokenState::Active && Utc::now() < self.created_at + ttl
    }
}

/// URL-safe random key, 32 bytes of entropy.
pub fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    thread_rng().fill(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("reset token not found")]
    NotFound,
    #[error("token store unavailable: {0}")]
    Persistence(String),
}

/// Persistence contract for reset tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Generate and durably persist a fresh active token for the user.
    /// Either the record exists afterwards or this reports failure.
    async fn create(&self, user_id: Uuid) -> Result<ResetToken, TokenStoreError>;

    /// Point lookup by key. Read-only.
    async fn get_by_key(&self, key: &str) -> Result<ResetToken, TokenStoreError>;

    /// Transition the token from `Active` to `Inactive`. Returns whether this
    /// call performed the transition; an already-inactive or unknown key is a
    /// no-op success, so a failed earlier attempt can be retried safely. An
    /// inactive record is never overwritten.
    async fn invalidate(&self, key: &str) -> Result<bool, TokenStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_unique_and_urlsafe() {
        let a = generate_key();
        let b = generate_key();
        assert_ne!(a, b);
        // 32 bytes -> 43 chars of unpadded base64
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_fresh_token_is_valid() {
        let token = ResetToken::issue(Uuid::new_v4());
        assert_eq!(token.state, TokenState::Active);
        assert!(token.is_valid(Duration::hours(24)));
    }

    #[test]
    fn test_token_expires_after_ttl() {
        let mut token = ResetToken::issue(Uuid::new_v4());
        token.created_at = Utc::now() - Duration::hours(25);
        assert!(!token.is_valid(Duration::hours(24)));
        // Still structurally active; only the window elapsed
        assert_eq!(token.state, TokenState::Active);
    }

    #[test]
    fn test_inactive_token_is_never_valid() {
        let mut token = ResetToken::issue(Uuid::new_v4());
        token.state = TokenState::Inactive;
        assert!(!token.is_valid(Duration::hours(24)));
    }
}
