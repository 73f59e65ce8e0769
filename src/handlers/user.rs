//! 用户资料的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{ValidatedJson, ValidatedPath},
    middleware::AppState,
    models::user::UpdateProfileRequest,
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 当前用户资料
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.user_service.profile(auth_context.user_id).await?;

    Ok(Json(profile))
}

/// 更新当前用户资料
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .user_service
        .update_profile(auth_context.user_id, req)
        .await?;

    Ok(Json(profile))
}

/// 公开资料
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.user_service.public_profile(id).await?;

    Ok(Json(profile))
}
