use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Response, StatusCode},
    middleware::{self, Next},
    routing::MethodRouter,
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::api::AppState;
use crate::auth;
use crate::error::ApiError;

/// One exposed operation: a path, its public/protected classification and its
/// method handlers. Duplicate methods on a path panic at registration time,
/// which is acceptable under the register-then-serve lifecycle.
pub struct Endpoint {
    pub path: &'static str,
    pub public: bool,
    pub methods: MethodRouter<AppState>,
}

impl Endpoint {
    pub fn public(path: &'static str, methods: MethodRouter<AppState>) -> Self {
        Self { path, public: true, methods }
    }

    pub fn protected(path: &'static str, methods: MethodRouter<AppState>) -> Self {
        Self { path, public: false, methods }
    }
}

/// Registry of exposed operations. Endpoints are registered during startup and
/// the set is immutable once the router has been built.
#[derive(Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, endpoint: Endpoint) {
        self.endpoints.push(endpoint);
    }

    /// Build the serving router. Protected endpoints get the authentication
    /// layer; it is attached with `route_layer`, which axum skips for unknown
    /// paths (404) and disallowed methods (405), so the method check always
    /// precedes authentication.
    pub fn into_router(self, state: AppState) -> Router {
        let mut router = Router::new();

        for endpoint in self.endpoints {
            let methods = if endpoint.public {
                endpoint.methods
            } else {
                endpoint.methods.route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    authenticate,
                ))
            };
            router = router.route(endpoint.path, methods);
        }

        router
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}

/// Dispatch-time authentication for protected endpoints. A missing or invalid
/// credential rejects the request here; handlers only run with a verified
/// identity in the request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<axum::response::Response, ApiError> {
    let raw = bearer_credential(request.headers());
    let identity = auth::verify_credential(&state.keys, raw.as_deref())?;

    let Some(identity) = identity else {
        return Err(ApiError::unauthenticated("Missing credential"));
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Extract the bearer credential from the authorization header, if any.
fn bearer_credential(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Last-resort boundary: a panicking handler becomes a 500 instead of tearing
/// down the serving loop.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("handler panicked: {}", detail);

    let body = serde_json::json!({
        "error": "Internal server error",
        "code": "INTERNAL_SERVER_ERROR",
    });

    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::from("{\"error\":\"Internal server error\"}")))
}
