use std::sync::Arc;

use tokio::sync::mpsc;

use crate::services::notify::Notifier;
use crate::services::user::User;
use crate::store::TokenStore;

/// Work item for the reset mailer: issue a token for this user and notify them.
#[derive(Debug, Clone)]
pub struct ResetJob {
    pub user: User,
}

/// Detached issuance + notification worker.
///
/// The request step promises delivery before the outcome is known, so jobs run
/// on a bounded queue off the request task. Failures anywhere in here are
/// logged for operational visibility and never reach a caller.
pub struct ResetMailer {
    tx: mpsc::Sender<ResetJob>,
}

impl ResetMailer {
    pub fn spawn(
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
        link_base_url: String,
        queue_size: usize,
        retry_attempts: u32,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel(queue_size.max(1));

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                issue_and_notify(&*tokens, &*notifier, &link_base_url, retry_attempts, &job).await;
            }
        });

        Self { tx }
    }

    /// Fire and forget. A full queue drops the job with an error log; the
    /// caller has already been answered either way.
    pub fn enqueue(&self, job: ResetJob) {
        if let Err(e) = self.tx.try_send(job) {
            tracing::error!("unable to queue reset notification: {}", e);
        }
    }
}

pub(crate) async fn issue_and_notify(
    tokens: &dyn TokenStore,
    notifier: &dyn Notifier,
    link_base_url: &str,
    retry_attempts: u32,
    job: &ResetJob,
) {
    let token = match tokens.create(job.user.id).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("unable to create a new reset token: {}", e);
            return;
        }
    };

    let body = format!("Access this link: {}/{}", link_base_url, token.key);

    for attempt in 1..=retry_attempts.max(1) {
        match notifier.send(&job.user.email, "Reset Password", &body).await {
            Ok(()) => return,
            Err(e) if attempt < retry_attempts => {
                tracing::warn!(attempt, "reset notification attempt failed: {}", e);
            }
            Err(e) => {
                tracing::error!("unable to send reset notification: {}", e);
            }
        }
    }
}
