//! Profile reads and self-service updates

use super::auth_service::hash_password;
use crate::{
    auth::PasswordHasher,
    config::SecurityConfig,
    error::AppError,
    models::user::{PublicUserProfile, UpdateProfileRequest, UserChanges, UserProfile},
    repository::Store,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct UserService {
    store: Arc<dyn Store>,
    hasher: Arc<PasswordHasher>,
    security: SecurityConfig,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, hasher: Arc<PasswordHasher>, security: SecurityConfig) -> Self {
        Self {
            store,
            hasher,
            security,
        }
    }

    /// The token may outlive its identity; a vanished subject is a 404
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok(user.into())
    }

    pub async fn public_profile(&self, user_id: Uuid) -> Result<PublicUserProfile, AppError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok(user.into())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<UserProfile, AppError> {
        let nickname = match req.nickname {
            Some(n) if n.trim().is_empty() => {
                return Err(AppError::validation("nickname must not be blank"))
            }
            Some(n) => Some(n.trim().to_string()),
            None => None,
        };

        if let Some(nickname) = &nickname {
            if let Some(holder) = self.store.find_user_by_nickname(nickname).await? {
                if holder.id != user_id {
                    return Err(AppError::conflict("Nickname already taken"));
                }
            }
        }

        let password_hash = match req.password {
            Some(password) => {
                PasswordHasher::validate_password_policy(&password, &self.security)?;
                Some(hash_password(self.hasher.clone(), password).await?)
            }
            None => None,
        };

        let changes = UserChanges {
            nickname,
            banner_url: req.banner_url,
            password_hash,
        };

        let user = self
            .store
            .update_user(user_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user.into())
    }
}
