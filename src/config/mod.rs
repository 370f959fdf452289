use serde::{Deserialize, Serialize};
use std::env;

/// Process-wide configuration, built once at startup and shared by reference.
/// Nothing here is reloaded per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub reset: ResetConfig,
    pub mailer: MailerConfig,
    pub locale: LocaleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Postgres connection string; in-memory stores are used when absent.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// PEM file holding the RS256 private key, used only when issuing credentials.
    pub signing_key_file: String,
    /// PEM file holding the RS256 public key, used to verify inbound credentials.
    pub verify_key_file: String,
    pub credential_ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfig {
    /// Fixed validity window for reset tokens, in hours.
    pub token_ttl_hours: u64,
    /// Prefix for the single-use link embedded in the notification body.
    pub link_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub queue_size: usize,
    pub retry_attempts: u32,
    /// Webhook endpoint for outbound notifications; log-only delivery when absent.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub default_locale: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::defaults().with_env_overrides()
    }

    fn defaults() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                database_url: None,
                database_max_connections: 10,
            },
            security: SecurityConfig {
                signing_key_file: "keys/signing_key.pem".to_string(),
                verify_key_file: "keys/verify_key.pem".to_string(),
                credential_ttl_hours: 24,
            },
            reset: ResetConfig {
                token_ttl_hours: 24,
                link_base_url: "http://localhost:3000/#/reset-password/step2".to_string(),
            },
            mailer: MailerConfig {
                queue_size: 64,
                retry_attempts: 3,
                webhook_url: None,
            },
            locale: LocaleConfig {
                default_locale: "en-US".to_string(),
            },
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.server.database_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.server.database_max_connections =
                v.parse().unwrap_or(self.server.database_max_connections);
        }

        // Security overrides
        if let Ok(v) = env::var("AUTH_SIGNING_KEY_FILE") {
            self.security.signing_key_file = v;
        }
        if let Ok(v) = env::var("AUTH_VERIFY_KEY_FILE") {
            self.security.verify_key_file = v;
        }
        if let Ok(v) = env::var("AUTH_CREDENTIAL_TTL_HOURS") {
            self.security.credential_ttl_hours =
                v.parse().unwrap_or(self.security.credential_ttl_hours);
        }

        // Reset token overrides
        if let Ok(v) = env::var("RESET_TOKEN_TTL_HOURS") {
            self.reset.token_ttl_hours = v.parse().unwrap_or(self.reset.token_ttl_hours);
        }
        if let Ok(v) = env::var("RESET_LINK_BASE_URL") {
            self.reset.link_base_url = v;
        }

        // Mailer overrides
        if let Ok(v) = env::var("MAILER_QUEUE_SIZE") {
            self.mailer.queue_size = v.parse().unwrap_or(self.mailer.queue_size);
        }
        if let Ok(v) = env::var("MAILER_RETRY_ATTEMPTS") {
            self.mailer.retry_attempts = v.parse().unwrap_or(self.mailer.retry_attempts);
        }
        if let Ok(v) = env::var("NOTIFY_WEBHOOK_URL") {
            self.mailer.webhook_url = Some(v);
        }

        // Locale overrides
        if let Ok(v) = env::var("DEFAULT_LOCALE") {
            self.locale.default_locale = v;
        }

        self
    }

    /// Reset token validity window as a duration.
    pub fn reset_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.reset.token_ttl_hours as i64)
    }
}
