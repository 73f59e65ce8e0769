//! Post models

use super::comment::CommentDto;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub reputation: i64,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
}

/// Listing order; always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    #[default]
    CreatedAt,
    Reputation,
}

impl PostSort {
    /// Unknown values fall back to newest first
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("reputation") => PostSort::Reputation,
            _ => PostSort::CreatedAt,
        }
    }
}

/// Raw listing query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub group_id: Option<Uuid>,
}

/// Normalized listing parameters handed to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub page: i64,
    pub limit: i64,
    pub sort: PostSort,
    pub group_id: Option<Uuid>,
}

impl PostFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl From<ListPostsQuery> for PostFilter {
    fn from(q: ListPostsQuery) -> Self {
        let page = q.page.unwrap_or(1).max(1);
        let limit = match q.limit {
            Some(l) if l >= 1 => l.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };

        Self {
            page,
            limit,
            sort: PostSort::parse(q.sort.as_deref()),
            group_id: q.group_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 10000, message = "content must be 1-10000 characters"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 16, message = "at most 16 media URLs"))]
    pub media_urls: Vec<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 10000, message = "content must be 1-10000 characters"))]
    pub content: Option<String>,
    #[validate(length(max = 16, message = "at most 16 media URLs"))]
    pub media_urls: Option<Vec<String>>,
}

/// Vote payload shared by posts and comments
#[derive(Debug, Deserialize, Validate)]
pub struct VoteRequest {
    #[validate(range(min = -1, max = 1, message = "value must be 1 or -1"))]
    pub value: i64,
}

impl VoteRequest {
    /// The reputation delta, exactly +1 or -1
    pub fn delta(&self) -> Option<i64> {
        match self.value {
            1 | -1 => Some(self.value),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub reputation: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub reputation: i64,
    pub created_at: DateTime<Utc>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPostsResponse {
    pub posts: Vec<PostDto>,
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailDto {
    #[serde(flatten)]
    pub post: PostDto,
    pub comments: Vec<CommentDto>,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            content: post.content,
            media_urls: post.media_urls,
            reputation: post.reputation,
            created_at: post.created_at,
            group_id: post.group_id,
        }
    }
}
