//! 认证服务：注册、登录、令牌刷新

use crate::{
    auth::{jwt::IssuedToken, JwtService, PasswordHasher},
    clock::Clock,
    config::SecurityConfig,
    error::AppError,
    models::user::{LoginRequest, NewUser, RegisterRequest, RegisterResponse, TokenResponse},
    repository::Store,
};
use std::sync::Arc;

pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
    clock: Arc<dyn Clock>,
    security: SecurityConfig,
    /// Verified against when the identity is unknown, so both login failures
    /// pay for one Argon2 run with the configured parameters
    dummy_digest: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        jwt_service: Arc<JwtService>,
        hasher: Arc<PasswordHasher>,
        clock: Arc<dyn Clock>,
        security: SecurityConfig,
    ) -> Result<Self, AppError> {
        let dummy_digest = hasher.hash("chirp-unknown-identity")?;

        Ok(Self {
            store,
            jwt_service,
            hasher,
            clock,
            security,
            dummy_digest,
        })
    }

    /// 用户注册
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, AppError> {
        let nickname = req.nickname.trim().to_string();
        let email = normalize_email(&req.email);

        if nickname.is_empty() {
            return Err(AppError::validation("nickname must not be blank"));
        }
        PasswordHasher::validate_password_policy(&req.password, &self.security)?;

        // Early answer; the unique constraint still settles races
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already taken"));
        }
        if self.store.find_user_by_nickname(&nickname).await?.is_some() {
            return Err(AppError::conflict("Nickname already taken"));
        }

        let password_hash = hash_password(self.hasher.clone(), req.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                nickname,
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user.into())
    }

    /// 用户登录
    ///
    /// Unknown identity and wrong password produce the same outcome, and both
    /// run one password verification.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AppError> {
        let user = match (req.email.as_deref(), req.nickname.as_deref()) {
            (Some(email), None) => self.store.find_user_by_email(&normalize_email(email)).await?,
            (None, Some(nickname)) => self.store.find_user_by_nickname(nickname.trim()).await?,
            _ => {
                return Err(AppError::validation(
                    "exactly one of email or nickname is required",
                ))
            }
        };

        let Some(user) = user else {
            verify_password(self.hasher.clone(), self.dummy_digest.clone(), req.password).await?;
            tracing::debug!("Login failed: unknown identity");
            return Err(AppError::Unauthorized);
        };

        let valid =
            verify_password(self.hasher.clone(), user.password_hash.clone(), req.password).await?;
        if !valid {
            tracing::debug!(user_id = %user.id, "Login failed: password mismatch");
            return Err(AppError::Unauthorized);
        }

        let issued = self.jwt_service.issue(user.id, self.clock.now())?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(issued.into())
    }

    /// 刷新令牌：仅在原令牌仍然有效时
    pub fn refresh(&self, token: &str) -> Result<TokenResponse, AppError> {
        let issued = self.jwt_service.refresh(token, self.clock.now())?;
        Ok(issued.into())
    }
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 is CPU-bound; keep it off the async workers
pub(crate) async fn hash_password(
    hasher: Arc<PasswordHasher>,
    password: String,
) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

pub(crate) async fn verify_password(
    hasher: Arc<PasswordHasher>,
    digest: String,
    password: String,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::SystemClock, repository::MemoryStore};
    use argon2::Params;

    fn service() -> AuthService {
        let security = SecurityConfig {
            jwt_secret: None,
            allow_insecure_dev_secret: false,
            password_min_length: 6,
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        };
        AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(JwtService::from_secret(b"test_secret_key_32_characters_long!")),
            Arc::new(PasswordHasher::with_params(
                Params::new(1024, 1, 1, None).unwrap(),
            )),
            Arc::new(SystemClock),
            security,
        )
        .unwrap()
    }

    fn register_req(nickname: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            nickname: nickname.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login_by_email_and_nickname() {
        let service = service();
        let registered = service
            .register(register_req("alice", "A@X.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(registered.email, "a@x.com");

        let by_email = LoginRequest {
            email: Some("a@x.com".to_string()),
            nickname: None,
            password: "secret1".to_string(),
        };
        assert!(service.login(by_email).await.is_ok());

        let by_nickname = LoginRequest {
            email: None,
            nickname: Some("alice".to_string()),
            password: "secret1".to_string(),
        };
        assert!(service.login(by_nickname).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service
            .register(register_req("alice", "a@x.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = LoginRequest {
            email: Some("a@x.com".to_string()),
            nickname: None,
            password: "secret2".to_string(),
        };
        let unknown = LoginRequest {
            email: Some("nobody@x.com".to_string()),
            nickname: None,
            password: "secret1".to_string(),
        };

        assert!(matches!(service.login(wrong_password).await, Err(AppError::Unauthorized)));
        assert!(matches!(service.login(unknown).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_unknown_identity_verifies_against_dummy_digest() {
        let service = service();

        // Same cost parameters as real user digests
        assert!(service.dummy_digest.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));

        // A password matching the dummy digest still cannot log in
        let matching_dummy = LoginRequest {
            email: None,
            nickname: Some("ghost".to_string()),
            password: "chirp-unknown-identity".to_string(),
        };
        assert!(service.hasher.verify(&service.dummy_digest, &matching_dummy.password));
        assert!(matches!(service.login(matching_dummy).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_requires_exactly_one_identifier() {
        let service = service();
        let both = LoginRequest {
            email: Some("a@x.com".to_string()),
            nickname: Some("alice".to_string()),
            password: "secret1".to_string(),
        };
        assert!(matches!(service.login(both).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_short_password() {
        let service = service();
        service
            .register(register_req("alice", "a@x.com", "secret1"))
            .await
            .unwrap();

        let dup = service.register(register_req("alice", "b@x.com", "secret1")).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let short = service.register(register_req("bob", "b@x.com", "short")).await;
        assert!(matches!(short, Err(AppError::Validation(_))));
    }
}
