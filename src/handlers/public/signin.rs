// handlers/public/signin.rs - POST /account/signin handler

use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::auth;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SigninForm {
    pub email: String,
    pub password: String,
}

/// POST /account/signin - verify credentials and issue a signed token.
///
/// The only place the signing key is used; everything else only verifies.
pub async fn signin(
    State(state): State<AppState>,
    Json(form): Json<SigninForm>,
) -> Result<Json<Value>, ApiError> {
    use crate::services::user::UserStoreError;

    let user = match state.users.verify_password(&form.email, &form.password).await {
        Ok(user) => user,
        // Unknown account and wrong password answer identically
        Err(UserStoreError::NotFound | UserStoreError::InvalidCredentials) => {
            return Err(ApiError::bad_request("Invalid email or password"));
        }
        Err(e) => return Err(e.into()),
    };

    let token = auth::generate_jwt(
        &state.keys,
        user.id,
        user.email.clone(),
        state.config.security.credential_ttl_hours,
    )?;

    Ok(Json(json!({ "token": token, "user": user })))
}
