//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// Signing secret used only when a developer explicitly opts in.
/// Never accepted outside `environment = development`.
pub const INSECURE_DEV_SECRET: &str = "chirp-insecure-development-secret-do-not-deploy";

/// Minimum accepted length of the HS256 signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Deployment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnvironment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8080"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Option<Secret<String>>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 密钥（使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Option<Secret<String>>,
    /// Permit the built-in development secret when `jwt_secret` is unset
    pub allow_insecure_dev_secret: bool,
    /// 密码最小长度
    pub password_min_length: usize,
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,
    /// Argon2 iterations
    pub argon2_iterations: u32,
    /// Argon2 lanes
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: DeployEnvironment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl SecurityConfig {
    /// Resolve the process-wide signing secret.
    ///
    /// A configured secret always wins. Without one, only an explicit
    /// development opt-in yields the insecure built-in secret; every other
    /// combination is a hard configuration error.
    pub fn signing_secret(&self, env: DeployEnvironment) -> Result<Secret<String>, ConfigError> {
        if let Some(secret) = &self.jwt_secret {
            if secret.expose_secret().len() < MIN_SECRET_LEN {
                return Err(ConfigError::Message(format!(
                    "JWT secret must be at least {} characters long",
                    MIN_SECRET_LEN
                )));
            }
            return Ok(secret.clone());
        }

        match (env, self.allow_insecure_dev_secret) {
            (DeployEnvironment::Development, true) => {
                tracing::warn!(
                    "CHIRP_SECURITY__JWT_SECRET is not set; using the insecure development secret"
                );
                Ok(Secret::new(INSECURE_DEV_SECRET.to_string()))
            }
            (DeployEnvironment::Development, false) => Err(ConfigError::Message(
                "JWT secret is not configured; set CHIRP_SECURITY__JWT_SECRET or opt in with \
                 CHIRP_SECURITY__ALLOW_INSECURE_DEV_SECRET=true"
                    .to_string(),
            )),
            (DeployEnvironment::Production, _) => Err(ConfigError::Message(
                "JWT secret is required in production".to_string(),
            )),
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("environment", "development")?
            .set_default("server.addr", "0.0.0.0:8080")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.body_limit_bytes", 1024 * 1024)?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.allow_insecure_dev_secret", false)?
            .set_default("security.password_min_length", 6)?
            .set_default("security.argon2_memory_kib", 65536)?
            .set_default("security.argon2_iterations", 3)?
            .set_default("security.argon2_parallelism", 4)?;

        // 从环境变量加载配置（前缀为 CHIRP_）
        settings = settings.add_source(
            Environment::with_prefix("CHIRP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        match self.database.backend {
            StorageBackend::Postgres => {
                if self.database.url.is_none() {
                    return Err(ConfigError::Message(
                        "database.url is required for the postgres backend".to_string(),
                    ));
                }
                if self.database.max_connections < self.database.min_connections {
                    return Err(ConfigError::Message(
                        "max_connections must be >= min_connections".to_string(),
                    ));
                }
            }
            StorageBackend::Memory => {
                if self.environment == DeployEnvironment::Production {
                    return Err(ConfigError::Message(
                        "the memory storage backend is not allowed in production".to_string(),
                    ));
                }
            }
        }

        // Fails startup when no usable signing secret exists
        self.security.signing_secret(self.environment)?;

        // 验证密码策略
        if self.security.password_min_length < 6 || self.security.password_min_length > 128 {
            return Err(ConfigError::Message(
                "password_min_length must be between 6 and 128".to_string(),
            ));
        }

        if self.security.argon2_iterations == 0 || self.security.argon2_parallelism == 0 {
            return Err(ConfigError::Message(
                "argon2 iterations and parallelism must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
