//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::extract_token,
    error::AppError,
    handlers::extract::ValidatedJson,
    middleware::AppState,
    models::user::{LoginRequest, RegisterRequest},
};
use axum::{extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// 刷新令牌
/// 令牌取自 Authorization 头，过期后不可刷新
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = extract_token(&headers)?;
    let response = state.auth_service.refresh(token)?;

    Ok(Json(response))
}
