//! Group handlers

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{ValidatedJson, ValidatedPath},
    middleware::AppState,
    models::group::{AddModeratorRequest, CreateGroupRequest, UpdateGroupRequest},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let group = state
        .group_service
        .create(auth_context.user_id, req)
        .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let groups = state.group_service.list().await?;

    Ok(Json(groups))
}

pub async fn get_group(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let group = state.group_service.detail(id).await?;

    Ok(Json(group))
}

pub async fn update_group(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let group = state
        .group_service
        .update(auth_context.user_id, id, req)
        .await?;

    Ok(Json(group))
}

pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.group_service.delete(auth_context.user_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_moderator(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<AddModeratorRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .group_service
        .add_moderator(auth_context.user_id, id, req.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_moderator(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath((id, user_id)): ValidatedPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .group_service
        .remove_moderator(auth_context.user_id, id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .group_service
        .subscribe(auth_context.user_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .group_service
        .unsubscribe(auth_context.user_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
