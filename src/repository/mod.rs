//! Storage collaborator
//!
//! Handlers and services only see these traits. `PgStore` backs them with
//! PostgreSQL, `MemoryStore` with in-process maps.

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use crate::{
    db::HealthStatus,
    error::Result,
    models::{
        comment::{Comment, NewComment},
        group::{Group, GroupChanges, GroupRoster, NewGroup},
        post::{NewPost, Post, PostChanges, PostFilter},
        user::{NewUser, User, UserChanges},
    },
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Missing ids are skipped
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    /// Fails with `Conflict` when email or nickname is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// One page of posts plus the total matching count
    async fn list_posts(&self, filter: &PostFilter) -> Result<(Vec<Post>, i64)>;

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>>;

    /// Removes the post together with its comments
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    /// Atomically add `delta` to the post and its author's post reputation.
    /// Returns the new post reputation, `None` if the post is gone.
    async fn apply_post_vote(&self, id: Uuid, delta: i64) -> Result<Option<i64>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Oldest first
    async fn list_comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    async fn update_comment(&self, id: Uuid, content: String) -> Result<Option<Comment>>;

    /// Replies to the deleted comment are detached, not removed
    async fn delete_comment(&self, id: Uuid) -> Result<bool>;

    async fn apply_comment_vote(&self, id: Uuid, delta: i64) -> Result<Option<i64>>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Creates the group with its creator as moderator and member
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>>;

    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn update_group(&self, id: Uuid, changes: GroupChanges) -> Result<Option<Group>>;

    /// Posts of the group are detached, not removed
    async fn delete_group(&self, id: Uuid) -> Result<bool>;

    async fn group_roster(&self, id: Uuid) -> Result<GroupRoster>;

    /// Set-union; `false` when already present
    async fn add_moderator(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Never removes the last moderator; `false` when nothing was removed
    async fn remove_moderator(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;
}

/// Everything the application needs from storage
#[async_trait]
pub trait Store: UserRepository + PostRepository + CommentRepository + GroupRepository {
    async fn health_check(&self) -> HealthStatus;
}
