use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use account_api::api;
use account_api::auth::AuthKeys;
use account_api::config::AppConfig;
use account_api::services::notify::{HttpNotifier, LogNotifier, Notifier};
use account_api::services::user::{MemoryUserStore, PgUserStore, UserStore};
use account_api::store::{MemoryTokenStore, PgTokenStore, TokenStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, key paths, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env();

    // Key material is process-wide configuration; failing to load it aborts
    // startup rather than surfacing per request.
    let keys = AuthKeys::load(
        &config.security.signing_key_file,
        &config.security.verify_key_file,
    )
    .context("loading secure keys")?;

    let notifier: Arc<dyn Notifier> = match &config.mailer.webhook_url {
        Some(url) => Arc::new(HttpNotifier::new(url.clone())),
        None => {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set; notifications go to the log only");
            Arc::new(LogNotifier)
        }
    };

    let (users, tokens): (Arc<dyn UserStore>, Arc<dyn TokenStore>) =
        match &config.server.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.server.database_max_connections)
                    .connect(url)
                    .await
                    .context("connecting to database")?;
                (
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgTokenStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory stores");
                (
                    Arc::new(MemoryUserStore::new()),
                    Arc::new(MemoryTokenStore::new()),
                )
            }
        };

    let port = config.server.port;
    let state = api::AppState::assemble(config, keys, users, tokens, notifier);
    let app = api::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;

    tracing::info!("account-api listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server")?;

    Ok(())
}
