//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chirp::{
    clock::Clock,
    config::{
        AppConfig, DatabaseConfig, DeployEnvironment, LoggingConfig, SecurityConfig,
        ServerConfig, StorageBackend,
    },
    middleware::AppState,
    repository::MemoryStore,
    routes,
    services::OwnershipPolicy,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置（内存存储，轻量 Argon2 参数）
pub fn create_test_config() -> AppConfig {
    AppConfig {
        environment: DeployEnvironment::Development,
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
            body_limit_bytes: 64 * 1024,
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Some(Secret::new(TEST_SECRET.to_string())),
            allow_insecure_dev_secret: false,
            password_min_length: 6,
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        },
    }
}

/// Clock the tests move by hand
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Router over a fresh in-memory store, plus the clock driving token expiry
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let state = AppState::new(
            create_test_config(),
            Arc::new(MemoryStore::new()),
            clock.clone(),
            Arc::new(OwnershipPolicy),
        )
        .expect("Failed to build test app state");

        Self {
            router: routes::create_router(Arc::new(state)),
            clock,
        }
    }

    /// 发送请求并解析 JSON 响应（空响应体解析为 Null）
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// 注册用户，返回用户 ID
    pub async fn register(&self, nickname: &str, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({ "nickname": nickname, "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["id"].as_str().unwrap().to_string()
    }

    /// 登录并返回令牌
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        response.body["token"].as_str().unwrap().to_string()
    }

    /// 注册并登录，返回 (用户 ID, 令牌)
    pub async fn sign_up(&self, nickname: &str) -> (String, String) {
        let email = format!("{}@example.com", nickname);
        let id = self.register(nickname, &email, "secret1").await;
        let token = self.login(&email, "secret1").await;
        (id, token)
    }

    pub async fn create_post(&self, token: &str, content: &str) -> String {
        let response = self
            .post("/api/v1/posts", Some(token), json!({ "content": content }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_group(&self, token: &str, name: &str) -> String {
        let response = self
            .post("/api/v1/groups", Some(token), json!({ "groupName": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["id"].as_str().unwrap().to_string()
    }
}
