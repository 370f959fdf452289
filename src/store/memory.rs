use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{ResetToken, TokenState, TokenStore, TokenStoreError};

/// In-memory token store, keyed by the token's secret key. Used by the test
/// suite and when no database is configured.
#[derive(Default)]
pub struct MemoryTokenStore {
    records: Mutex<HashMap<String, ResetToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ResetToken>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, user_id: Uuid) -> Result<ResetToken, TokenStoreError> {
        let token = ResetToken::issue(user_id);
        self.lock().insert(token.key.clone(), token.clone());
        Ok(token)
    }

    async fn get_by_key(&self, key: &str) -> Result<ResetToken, TokenStoreError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or(TokenStoreError::NotFound)
    }

    async fn invalidate(&self, key: &str) -> Result<bool, TokenStoreError> {
        let mut records = self.lock();
        match records.get_mut(key) {
            Some(token) if token.state == TokenState::Active => {
                token.state = TokenState::Inactive;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_then_get_by_key_roundtrip() {
        let store = MemoryTokenStore::new();
        let user_id = Uuid::new_v4();

        let created = store.create(user_id).await.unwrap();
        let fetched = store.get_by_key(&created.key).await.unwrap();

        assert_eq!(fetched.user_id, user_id);
        assert_eq!(fetched.key, created.key);
        assert!(fetched.is_valid(Duration::hours(24)));
    }

    #[tokio::test]
    async fn test_get_by_key_unknown_is_not_found() {
        let store = MemoryTokenStore::new();
        assert!(matches!(
            store.get_by_key("missing").await,
            Err(TokenStoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_invalidate_transitions_exactly_once() {
        let store = MemoryTokenStore::new();
        let token = store.create(Uuid::new_v4()).await.unwrap();

        assert!(store.invalidate(&token.key).await.unwrap());
        // Second call is a no-op success, not an error
        assert!(!store.invalidate(&token.key).await.unwrap());

        let fetched = store.get_by_key(&token.key).await.unwrap();
        assert_eq!(fetched.state, TokenState::Inactive);
        assert!(!fetched.is_valid(Duration::hours(24)));
    }

    #[tokio::test]
    async fn test_invalidate_unknown_key_is_noop() {
        let store = MemoryTokenStore::new();
        assert!(!store.invalidate("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_state_is_monotonic() {
        let store = MemoryTokenStore::new();
        let token = store.create(Uuid::new_v4()).await.unwrap();

        store.invalidate(&token.key).await.unwrap();
        store.invalidate(&token.key).await.unwrap();
        store.invalidate(&token.key).await.unwrap();

        let fetched = store.get_by_key(&token.key).await.unwrap();
        assert_eq!(fetched.state, TokenState::Inactive);
    }
}
