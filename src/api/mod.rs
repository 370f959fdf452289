pub mod context;
pub mod endpoint;
pub mod locale;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::auth::AuthKeys;
use crate::config::AppConfig;
use crate::handlers;
use crate::services::mailer::ResetMailer;
use crate::services::notify::Notifier;
use crate::services::reset::PasswordResetService;
use crate::services::user::UserStore;
use crate::store::TokenStore;

use endpoint::{Endpoint, EndpointRegistry};

/// Shared collaborator handles. Immutable after startup; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<AuthKeys>,
    pub users: Arc<dyn UserStore>,
    pub reset: Arc<PasswordResetService>,
}

impl AppState {
    /// Wire the collaborators together: the mailer worker is spawned here and
    /// handed to the reset workflow. Must run inside a tokio runtime.
    pub fn assemble(
        config: AppConfig,
        keys: AuthKeys,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let config = Arc::new(config);

        let mailer = ResetMailer::spawn(
            tokens.clone(),
            notifier,
            config.reset.link_base_url.clone(),
            config.mailer.queue_size,
            config.mailer.retry_attempts,
        );
        let reset = Arc::new(PasswordResetService::new(
            users.clone(),
            tokens,
            mailer,
            config.reset_token_ttl(),
        ));

        Self {
            config,
            keys: Arc::new(keys),
            users,
            reset,
        }
    }
}

/// Register every exposed operation and build the serving router.
pub fn app(state: AppState) -> Router {
    let mut registry = EndpointRegistry::new();

    registry.register(Endpoint::public("/health", get(handlers::health)));
    registry.register(Endpoint::public(
        "/account/signin",
        post(handlers::public::signin),
    ));
    registry.register(Endpoint::public(
        "/account/reset-password",
        post(handlers::public::reset_request),
    ));
    registry.register(Endpoint::public(
        "/account/reset-password/validate-key",
        post(handlers::public::reset_validate_key),
    ));
    registry.register(Endpoint::public(
        "/account/reset-password/complete",
        post(handlers::public::reset_complete),
    ));
    registry.register(Endpoint::protected(
        "/account/me",
        get(handlers::protected::account_me),
    ));

    registry.into_router(state)
}
