//! HTTP 中间件
//! 应用状态与请求追踪

use crate::{
    auth::{JwtService, PasswordHasher},
    clock::Clock,
    config::AppConfig,
    error::AppError,
    repository::Store,
    services::{
        AuthService, AuthorizationPolicy, CommentService, GroupService, PostService, UserService,
    },
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// Immutable after startup; shared by every request through `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub jwt_service: Arc<JwtService>,
    pub clock: Arc<dyn Clock>,
    pub policy: Arc<dyn AuthorizationPolicy>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub comment_service: Arc<CommentService>,
    pub group_service: Arc<GroupService>,
}

impl AppState {
    /// Wire all services from configuration and the chosen collaborators
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        policy: Arc<dyn AuthorizationPolicy>,
    ) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        let hasher = Arc::new(PasswordHasher::from_config(&config.security)?);

        let auth_service = Arc::new(AuthService::new(
            store.clone(),
            jwt_service.clone(),
            hasher.clone(),
            clock.clone(),
            config.security.clone(),
        )?);
        let user_service = Arc::new(UserService::new(
            store.clone(),
            hasher,
            config.security.clone(),
        ));
        let post_service = Arc::new(PostService::new(store.clone(), policy.clone()));
        let comment_service = Arc::new(CommentService::new(store.clone(), policy.clone()));
        let group_service = Arc::new(GroupService::new(store.clone(), policy.clone()));

        Ok(Self {
            config,
            store,
            jwt_service,
            clock,
            policy,
            auth_service,
            user_service,
            post_service,
            comment_service,
            group_service,
        })
    }
}

tokio::task_local! {
    static REQUEST_ID: String;
}

/// The id the tracking middleware assigned to the request being served, if any
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();

        let mut response = REQUEST_ID.scope(request_id.clone(), next.run(req)).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签使用静态字符串
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_code = match status {
            200 => "200",
            201 => "201",
            204 => "204",
            400 => "400",
            401 => "401",
            403 => "403",
            404 => "404",
            409 => "409",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
