use std::sync::Arc;

use axum::{
    extract::{Extension, State, Json},
    http::HeaderMap,
};
use tracing::debug;

use shared_models::auth::{TokenResponse, UserProfile};
use shared_models::error::AppError;
use shared_models::ApiResponse;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token;

use crate::router::AuthState;

pub async fn validate_session(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    debug!("Validating session token");

    let token = bearer_token(&headers)?;

    let user = validate_token(token, &state.config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    Ok(Json(ApiResponse::ok(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
    })))
}

/// Profile of the signed-in user, as resolved by the role gate.
pub async fn get_me(
    Extension(profile): Extension<UserProfile>,
) -> Json<ApiResponse<UserProfile>> {
    debug!("Returning profile for user: {}", profile.id);
    Json(ApiResponse::ok(profile))
}
