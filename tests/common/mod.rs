use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use account_api::api::{self, AppState};
use account_api::auth::AuthKeys;
use account_api::config::{
    AppConfig, LocaleConfig, MailerConfig, ResetConfig, SecurityConfig, ServerConfig,
};
use account_api::services::notify::{Notifier, NotifyError};
use account_api::services::user::MemoryUserStore;
use account_api::store::MemoryTokenStore;

const SIGNING_PEM: &str = include_str!("../fixtures/signing_key.pem");
const VERIFY_PEM: &str = include_str!("../fixtures/verify_key.pem");

pub const LINK_BASE_URL: &str = "http://app.test/#/reset-password/step2";

/// Notifier double that records every message.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Fully wired app over in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub tokens: Arc<MemoryTokenStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config(token_ttl_hours: u64) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            database_url: None,
            database_max_connections: 1,
        },
        security: SecurityConfig {
            signing_key_file: String::new(),
            verify_key_file: String::new(),
            credential_ttl_hours: 24,
        },
        reset: ResetConfig {
            token_ttl_hours,
            link_base_url: LINK_BASE_URL.to_string(),
        },
        mailer: MailerConfig {
            queue_size: 16,
            retry_attempts: 3,
            webhook_url: None,
        },
        locale: LocaleConfig {
            default_locale: "en-US".to_string(),
        },
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with_ttl(24)
}

pub fn spawn_app_with_ttl(token_ttl_hours: u64) -> TestApp {
    let keys = AuthKeys::from_pem(SIGNING_PEM.as_bytes(), VERIFY_PEM.as_bytes())
        .expect("test key fixtures");
    let users = Arc::new(MemoryUserStore::new());
    let tokens = Arc::new(MemoryTokenStore::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState::assemble(
        test_config(token_ttl_hours),
        keys,
        users.clone(),
        tokens.clone(),
        notifier.clone(),
    );

    TestApp {
        router: api::app(state.clone()),
        state,
        users,
        tokens,
        notifier,
    }
}

pub async fn post_json(router: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(router, request).await
}

pub async fn get(router: &Router, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).expect("request");
    send(router, request).await
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Wait until at least `count` notifications have been delivered by the
/// mailer worker.
pub async fn wait_for_notifications(notifier: &RecordingNotifier, count: usize) -> Vec<SentMail> {
    for _ in 0..200 {
        let sent = notifier.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} notification(s), got {:?}", count, notifier.sent());
}

/// Pull the reset key out of a notification body; the single-use link ends
/// with it.
pub fn key_from_mail(mail: &SentMail) -> String {
    mail.body
        .rsplit('/')
        .next()
        .expect("link in notification body")
        .to_string()
}
