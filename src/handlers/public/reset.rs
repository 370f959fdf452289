// handlers/public/reset.rs - password reset endpoints

use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::error::ApiError;
use crate::services::reset::ValidKey;

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
}

/// POST /account/reset-password - start a reset for the given email.
///
/// Always answers "Email sent" for a well-formed address, whether or not an
/// account exists; anything else would allow account enumeration.
pub async fn reset_request(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordForm>,
) -> Result<Json<Value>, ApiError> {
    let message = state.reset.request(&form.email).await?;
    Ok(Json(json!({ "message": message })))
}

#[derive(Debug, Deserialize)]
pub struct ValidateKeyForm {
    pub key: String,
}

/// POST /account/reset-password/validate-key - turn a key into a capability.
pub async fn reset_validate_key(
    State(state): State<AppState>,
    Json(form): Json<ValidateKeyForm>,
) -> Result<Json<ValidKey>, ApiError> {
    let valid_key = state.reset.validate(&form.key).await?;
    Ok(Json(valid_key))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub password: String,
    pub password_again: String,
    pub valid_key: ValidKey,
}

/// POST /account/reset-password/complete - apply the new password and consume
/// the token.
pub async fn reset_complete(
    State(state): State<AppState>,
    Json(form): Json<ChangePasswordForm>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .reset
        .complete(&form.password, &form.password_again, &form.valid_key)
        .await?;
    Ok(Json(json!({ "user": user })))
}
