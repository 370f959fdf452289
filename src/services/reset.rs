use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::mailer::{ResetJob, ResetMailer};
use crate::services::user::{User, UserStore, UserStoreError};
use crate::store::{TokenStore, TokenStoreError};

/// Capability echoed between the validate and complete steps. The key alone is
/// the proof; no session state exists between the two calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidKey {
    pub user_id: Uuid,
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("passwords mismatch")]
    PasswordMismatch,
    #[error("invalid key")]
    InvalidKey,
    #[error("user not found")]
    UserNotFound,
    #[error("credential update failed: {0}")]
    CredentialUpdate(String),
    #[error(transparent)]
    Store(#[from] TokenStoreError),
}

/// Password-reset workflow: request issues a token out of band, validate turns
/// a key into a capability, complete applies the password change and consumes
/// the token.
pub struct PasswordResetService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    mailer: ResetMailer,
    token_ttl: chrono::Duration,
    /// Per-key guards so concurrent completions serialize; only one of them
    /// ever observes a valid token.
    completion_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PasswordResetService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        mailer: ResetMailer,
        token_ttl: chrono::Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            token_ttl,
            completion_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Request step. The response never reveals whether the email matched an
    /// account; issuance and notification happen on the mailer queue after the
    /// caller has been answered.
    pub async fn request(&self, email: &str) -> Result<&'static str, ResetError> {
        if !plausible_email(email) {
            return Err(ResetError::InvalidEmail);
        }

        match self.users.get_by_email(email).await {
            Ok(user) => self.mailer.enqueue(ResetJob { user }),
            Err(UserStoreError::NotFound) => {
                tracing::debug!("reset requested for unknown email");
            }
            Err(e) => {
                // Same uniform answer; the lookup failure stays in the logs
                tracing::error!("user lookup failed during reset request: {}", e);
            }
        }

        Ok("Email sent")
    }

    /// Validate step. Absent, expired and consumed keys are indistinguishable.
    pub async fn validate(&self, key: &str) -> Result<ValidKey, ResetError> {
        let token = match self.tokens.get_by_key(key).await {
            Ok(token) => token,
            Err(TokenStoreError::NotFound) => return Err(ResetError::InvalidKey),
            Err(e) => return Err(ResetError::Store(e)),
        };

        if !token.is_valid(self.token_ttl) {
            return Err(ResetError::InvalidKey);
        }

        Ok(ValidKey {
            user_id: token.user_id,
            key: key.to_string(),
        })
    }

    /// Complete step. The key is re-validated rather than trusted from the
    /// earlier call, the user mutation is strictly ordered before token
    /// invalidation, and an invalidation failure after a durable password
    /// change is logged rather than surfaced.
    pub async fn complete(
        &self,
        password: &str,
        password_again: &str,
        valid_key: &ValidKey,
    ) -> Result<User, ResetError> {
        if password != password_again {
            return Err(ResetError::PasswordMismatch);
        }

        let guard = self.completion_lock(&valid_key.key);
        let result = {
            let _held = guard.lock().await;
            self.complete_locked(password, valid_key).await
        };

        drop(guard);
        self.release_completion_lock(&valid_key.key);
        result
    }

    async fn complete_locked(
        &self,
        password: &str,
        valid_key: &ValidKey,
    ) -> Result<User, ResetError> {
        let token = match self.tokens.get_by_key(&valid_key.key).await {
            Ok(token) => token,
            Err(TokenStoreError::NotFound) => return Err(ResetError::InvalidKey),
            Err(e) => return Err(ResetError::Store(e)),
        };
        if !token.is_valid(self.token_ttl) {
            return Err(ResetError::InvalidKey);
        }
        let user = match self.users.get_by_id(token.user_id).await {
            Ok(user) => user,
            Err(UserStoreError::NotFound) => return Err(ResetError::UserNotFound),
            Err(e) => return Err(ResetError::CredentialUpdate(e.to_string())),
        };

        let updated = self
            .users
            .update_password(user.id, password)
            .await
            .map_err(|e| ResetError::CredentialUpdate(e.to_string()))?;

        // The password change is durable at this point; a failed invalidation
        // leaves a stale active token but must not fail the call.
        match self.tokens.invalidate(&valid_key.key).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("reset token was already inactive at completion"),
            Err(e) => tracing::error!("unable to invalidate reset token: {}", e),
        }

        Ok(updated)
    }

    fn completion_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .completion_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn release_completion_lock(&self, key: &str) {
        let mut locks = self
            .completion_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(guard) = locks.get(key) {
            // Drop the entry once no other completion holds it
            if Arc::strong_count(guard) == 1 {
                locks.remove(key);
            }
        }
    }
}

fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && domain.contains('.') && !email.contains(' ')
}
