use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::debug;

use shared_models::error::AppError;
use shared_models::ApiResponse;

use crate::models::Professional;
use crate::router::ProfessionalState;

pub async fn list_professionals(
    State(state): State<Arc<ProfessionalState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<ApiResponse<Vec<Professional>>>, AppError> {
    let professionals = state.directory.list(auth.token()).await?;
    Ok(Json(ApiResponse::ok(professionals.as_ref().clone())))
}

pub async fn get_professional(
    State(state): State<Arc<ProfessionalState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(professional_id): Path<String>,
) -> Result<Json<ApiResponse<Professional>>, AppError> {
    debug!("Looking up professional: {}", professional_id);

    let professional = state.directory.get(&professional_id, auth.token()).await?
        .ok_or_else(|| AppError::NotFound(format!("Professional {} not found", professional_id)))?;

    Ok(Json(ApiResponse::ok(professional)))
}
