//! Identity models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Stored identity. `password_hash` never leaves the process.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub banner_url: Option<String>,
    pub reputation_posts: i64,
    pub reputation_comments: i64,
    pub registered_at: DateTime<Utc>,
}

/// Insert payload for a new identity
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub nickname: Option<String>,
    pub banner_url: Option<String>,
    pub password_hash: Option<String>,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "nickname must be 1-50 characters"))]
    pub nickname: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(max = 128, message = "password is too long"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

/// Login by email or nickname; exactly one must be given
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub nickname: Option<String>,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Issued or refreshed token
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "nickname must be 1-50 characters"))]
    pub nickname: Option<String>,
    #[validate(url(message = "bannerUrl must be a URL"))]
    pub banner_url: Option<String>,
    #[validate(length(max = 128, message = "password is too long"))]
    pub password: Option<String>,
}

/// Private profile, visible only to its owner
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub banner_url: Option<String>,
    pub post_reputation: i64,
    pub comment_reputation: i64,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserProfile {
    pub id: Uuid,
    pub nickname: String,
    pub banner_url: Option<String>,
}

impl From<User> for RegisterResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            email: user.email,
            registered_at: user.registered_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            email: user.email,
            banner_url: user.banner_url,
            post_reputation: user.reputation_posts,
            comment_reputation: user.reputation_comments,
            registered_at: user.registered_at,
        }
    }
}

impl From<User> for PublicUserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            banner_url: user.banner_url,
        }
    }
}
