use async_trait::async_trait;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification channel. Delivery reliability is the collaborator's
/// problem; callers only see success or a single error kind.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Posts notifications as JSON to a mail webhook.
pub struct HttpNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl HttpNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({
                "to": recipient,
                "subject": subject,
                "body": body,
            }))
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(format!(
                "webhook returned {}",
                response.status()
            )))
        }
    }
}

/// Fallback when no webhook is configured: the notification only reaches the
/// logs. Useful for local runs.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(recipient, subject, body, "notification (log-only delivery)");
        Ok(())
    }
}
