// handlers/protected/account.rs - GET /account/me handler

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::api::context::RequestContext;
use crate::api::AppState;
use crate::error::ApiError;

/// GET /account/me - current account details for the verified caller.
pub async fn account_me(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Value>, ApiError> {
    // Dispatch rejects unauthenticated calls before this runs; the context
    // type still models the identity as optional because public endpoints
    // share it.
    let identity = ctx
        .identity
        .ok_or_else(|| ApiError::unauthenticated("Missing credential"))?;

    let user = state.users.get_by_id(identity.user_id).await?;

    Ok(Json(json!({ "user": user, "locale": ctx.locale.as_str() })))
}
