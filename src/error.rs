// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// This is the single place where error kinds map to response codes and
/// bodies; handlers never write responses directly. Authentication failures
/// and invalid reset keys deliberately share the 400 class with validation
/// errors so the transport never distinguishes "bad credential" from
/// "bad input".
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation(String),
    Unauthenticated(String),
    InvalidKey,

    // 500 Internal Server Error
    NotFound(String),
    Internal(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Validation(_) => 400,
            ApiError::Unauthenticated(_) => 400,
            ApiError::InvalidKey => 400,
            ApiError::NotFound(_) => 500,
            ApiError::Internal(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Validation(msg) => msg,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::InvalidKey => "Invalid Key",
            ApiError::NotFound(msg) => msg,
            ApiError::Internal(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::InvalidKey => "INVALID_KEY",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message(),
            "code": self.error_code(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert collaborator error types to ApiError
impl From<crate::store::TokenStoreError> for ApiError {
    fn from(err: crate::store::TokenStoreError) -> Self {
        match err {
            crate::store::TokenStoreError::NotFound => ApiError::InvalidKey,
            crate::store::TokenStoreError::Persistence(msg) => {
                tracing::error!("token store error: {}", msg);
                ApiError::internal("Could not process the request")
            }
        }
    }
}

impl From<crate::services::user::UserStoreError> for ApiError {
    fn from(err: crate::services::user::UserStoreError) -> Self {
        match err {
            crate::services::user::UserStoreError::NotFound => {
                ApiError::not_found("User not found")
            }
            crate::services::user::UserStoreError::InvalidCredentials => {
                // Flattened with bad input on purpose
                ApiError::bad_request("Invalid email or password")
            }
            crate::services::user::UserStoreError::Persistence(msg) => {
                tracing::error!("user store error: {}", msg);
                ApiError::internal("Could not process the request")
            }
        }
    }
}

impl From<crate::services::reset::ResetError> for ApiError {
    fn from(err: crate::services::reset::ResetError) -> Self {
        use crate::services::reset::ResetError;
        match err {
            ResetError::InvalidEmail => ApiError::validation("Invalid email address"),
            ResetError::PasswordMismatch => ApiError::validation("Passwords mismatch"),
            ResetError::InvalidKey => ApiError::InvalidKey,
            ResetError::UserNotFound => ApiError::not_found("User not found"),
            ResetError::CredentialUpdate(msg) => {
                tracing::error!("credential update failed: {}", msg);
                ApiError::internal("Could not change user password")
            }
            ResetError::Store(e) => e.into(),
        }
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            crate::auth::AuthError::InvalidCredential(msg) => {
                tracing::debug!("credential rejected: {}", msg);
                ApiError::unauthenticated("Invalid credential")
            }
            crate::auth::AuthError::Signing(msg) => {
                tracing::error!("credential signing failed: {}", msg);
                ApiError::internal("Could not issue credential")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
