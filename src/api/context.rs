use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::header::ACCEPT_LANGUAGE, http::request::Parts};

use crate::api::locale::{self, Locale};
use crate::api::AppState;
use crate::auth::Identity;

/// Per-request execution context: the verified identity (absent on public
/// endpoints) and the resolved locale. Built at extraction time and owned by
/// the single request being served.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Option<Identity>,
    pub locale: Locale,
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().cloned();
        let header = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        let locale = locale::resolve(header, &state.config.locale.default_locale);

        Ok(Self { identity, locale })
    }
}
