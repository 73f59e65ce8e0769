//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::{auth::middleware::jwt_auth_middleware, handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let health_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 无需认证的读取与认证入口
    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh_token))
        .route("/api/v1/users/{id}", get(handlers::user::get_user))
        .route("/api/v1/posts", get(handlers::post::list_posts))
        .route("/api/v1/posts/{id}", get(handlers::post::get_post))
        .route(
            "/api/v1/comments/posts/{id}/comments",
            get(handlers::comment::list_post_comments),
        )
        .route("/api/v1/groups", get(handlers::group::list_groups))
        .route("/api/v1/groups/{id}", get(handlers::group::get_group));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route(
            "/api/v1/users/me",
            get(handlers::user::get_me).put(handlers::user::update_me),
        )
        .route("/api/v1/posts", post(handlers::post::create_post))
        .route(
            "/api/v1/posts/{id}",
            put(handlers::post::update_post).delete(handlers::post::delete_post),
        )
        .route("/api/v1/posts/{id}/vote", post(handlers::post::vote_post))
        .route("/api/v1/comments", post(handlers::comment::create_comment))
        .route(
            "/api/v1/comments/{id}",
            put(handlers::comment::update_comment).delete(handlers::comment::delete_comment),
        )
        .route(
            "/api/v1/comments/{id}/vote",
            post(handlers::comment::vote_comment),
        )
        .route("/api/v1/groups", post(handlers::group::create_group))
        .route(
            "/api/v1/groups/{id}",
            put(handlers::group::update_group).delete(handlers::group::delete_group),
        )
        .route(
            "/api/v1/groups/{id}/moderators",
            post(handlers::group::add_moderator),
        )
        .route(
            "/api/v1/groups/{id}/moderators/{user_id}",
            delete(handlers::group::remove_moderator),
        )
        .route(
            "/api/v1/groups/{id}/subscribe",
            post(handlers::group::subscribe).delete(handlers::group::unsubscribe),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    let body_limit = state.config.server.body_limit_bytes;

    // 组合所有路由
    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
