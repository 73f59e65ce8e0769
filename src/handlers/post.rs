//! Post handlers

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{ValidatedJson, ValidatedPath, ValidatedQuery},
    middleware::AppState,
    models::post::{CreatePostRequest, ListPostsQuery, UpdatePostRequest, VoteRequest},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = state.post_service.create(auth_context.user_id, req).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListPostsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.post_service.list(query).await?;

    Ok(Json(page))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let post = state.post_service.detail(id).await?;

    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = state
        .post_service
        .update(auth_context.user_id, id, req)
        .await?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.post_service.delete(auth_context.user_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_post(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let vote = state.post_service.vote(auth_context.user_id, id, req).await?;

    Ok(Json(vote))
}
