//! Comment handlers

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{ValidatedJson, ValidatedPath},
    middleware::AppState,
    models::{
        comment::{CreateCommentRequest, UpdateCommentRequest},
        post::VoteRequest,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state
        .comment_service
        .create(auth_context.user_id, req)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_post_comments(
    State(state): State<Arc<AppState>>,
    ValidatedPath(post_id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let comments = state.comment_service.list_for_post(post_id).await?;

    Ok(Json(comments))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state
        .comment_service
        .update(auth_context.user_id, id, req)
        .await?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .comment_service
        .delete(auth_context.user_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_comment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let vote = state
        .comment_service
        .vote(auth_context.user_id, id, req)
        .await?;

    Ok(Json(vote))
}
