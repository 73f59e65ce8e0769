//! In-process storage backend for development and tests

use super::{CommentRepository, GroupRepository, PostRepository, Store, UserRepository};
use crate::{
    db::HealthStatus,
    error::{AppError, Result},
    models::{
        comment::{Comment, NewComment},
        group::{Group, GroupChanges, GroupRoster, NewGroup},
        post::{NewPost, Post, PostChanges, PostFilter, PostSort},
        user::{NewUser, User, UserChanges},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    // Insertion order doubles as the tiebreak for equal timestamps
    posts: Vec<Post>,
    comments: Vec<Comment>,
    groups: Vec<Group>,
    rosters: HashMap<Uuid, GroupRoster>,
}

impl State {
    fn nickname_taken(&self, nickname: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.nickname == nickname && Some(u.id) != except)
    }

    fn group_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.groups
            .iter()
            .any(|g| g.group_name == name && Some(g.id) != except)
    }
}

/// Every operation runs under one lock, so votes and cascades are atomic
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.nickname == nickname).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict("Email already taken"));
        }
        if state.nickname_taken(&user.nickname, None) {
            return Err(AppError::conflict("Nickname already taken"));
        }

        let created = User {
            id: Uuid::new_v4(),
            nickname: user.nickname,
            email: user.email,
            password_hash: user.password_hash,
            banner_url: None,
            reputation_posts: 0,
            reputation_comments: 0,
            registered_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let mut state = self.state.write().await;

        if let Some(nickname) = &changes.nickname {
            if state.nickname_taken(nickname, Some(id)) {
                return Err(AppError::conflict("Nickname already taken"));
            }
        }

        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(nickname) = changes.nickname {
            user.nickname = nickname;
        }
        if let Some(banner_url) = changes.banner_url {
            user.banner_url = Some(banner_url);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let created = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            content: post.content,
            media_urls: post.media_urls,
            reputation: 0,
            group_id: post.group_id,
            created_at: Utc::now(),
        };
        self.state.write().await.posts.push(created.clone());

        Ok(created)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<(Vec<Post>, i64)> {
        let state = self.state.read().await;

        // Newest insertion first, then a stable sort keeps it as the tiebreak
        let mut matching: Vec<&Post> = state
            .posts
            .iter()
            .rev()
            .filter(|p| filter.group_id.map_or(true, |g| p.group_id == Some(g)))
            .collect();
        match filter.sort {
            PostSort::CreatedAt => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            PostSort::Reputation => matching.sort_by(|a, b| b.reputation.cmp(&a.reputation)),
        }

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset().max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(media_urls) = changes.media_urls {
            post.media_urls = media_urls;
        }

        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        if state.posts.len() == before {
            return Ok(false);
        }

        state.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn apply_post_vote(&self, id: Uuid, delta: i64) -> Result<Option<i64>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        post.reputation += delta;
        let (reputation, author_id) = (post.reputation, post.author_id);
        if let Some(author) = state.users.get_mut(&author_id) {
            author.reputation_posts += delta;
        }

        Ok(Some(reputation))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content,
            reputation: 0,
            is_reply: comment.reply_to_id.is_some(),
            reply_to_id: comment.reply_to_id,
            created_at: Utc::now(),
        };
        self.state.write().await.comments.push(created.clone());

        Ok(created)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, content: String) -> Result<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.content = content;
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        if state.comments.len() == before {
            return Ok(false);
        }

        for reply in state.comments.iter_mut().filter(|c| c.reply_to_id == Some(id)) {
            reply.reply_to_id = None;
        }
        Ok(true)
    }

    async fn apply_comment_vote(&self, id: Uuid, delta: i64) -> Result<Option<i64>> {
        let mut state = self.state.write().await;
        let Some(comment) = state.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        comment.reputation += delta;
        let (reputation, author_id) = (comment.reputation, comment.author_id);
        if let Some(author) = state.users.get_mut(&author_id) {
            author.reputation_comments += delta;
        }

        Ok(Some(reputation))
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;

        if state.group_name_taken(&group.group_name, None) {
            return Err(AppError::conflict("Group name already taken"));
        }

        let created = Group {
            id: Uuid::new_v4(),
            group_name: group.group_name,
            description: group.description,
            banner_url: group.banner_url,
            registered_at: Utc::now(),
        };
        state.groups.push(created.clone());
        state.rosters.insert(
            created.id,
            GroupRoster {
                moderators: vec![group.creator_id],
                members: vec![group.creator_id],
            },
        );

        Ok(created)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        let mut groups = state.groups.clone();
        groups.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));

        Ok(groups)
    }

    async fn update_group(&self, id: Uuid, changes: GroupChanges) -> Result<Option<Group>> {
        let mut state = self.state.write().await;

        if let Some(name) = &changes.group_name {
            if state.group_name_taken(name, Some(id)) {
                return Err(AppError::conflict("Group name already taken"));
            }
        }

        let Some(group) = state.groups.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.group_name {
            group.group_name = name;
        }
        if let Some(description) = changes.description {
            group.description = Some(description);
        }
        if let Some(banner_url) = changes.banner_url {
            group.banner_url = Some(banner_url);
        }

        Ok(Some(group.clone()))
    }

    async fn delete_group(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Ok(false);
        }

        state.rosters.remove(&id);
        for post in state.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(true)
    }

    async fn group_roster(&self, id: Uuid) -> Result<GroupRoster> {
        let state = self.state.read().await;
        Ok(state.rosters.get(&id).cloned().unwrap_or_default())
    }

    async fn add_moderator(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(roster) = state.rosters.get_mut(&group_id) else {
            return Ok(false);
        };

        Ok(insert_unique(&mut roster.moderators, user_id))
    }

    async fn remove_moderator(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(roster) = state.rosters.get_mut(&group_id) else {
            return Ok(false);
        };
        if roster.moderators.len() <= 1 {
            return Ok(false);
        }

        Ok(remove_present(&mut roster.moderators, user_id))
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(roster) = state.rosters.get_mut(&group_id) else {
            return Ok(false);
        };

        Ok(insert_unique(&mut roster.members, user_id))
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(roster) = state.rosters.get_mut(&group_id) else {
            return Ok(false);
        };

        Ok(remove_present(&mut roster.members, user_id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

fn insert_unique(set: &mut Vec<Uuid>, id: Uuid) -> bool {
    if set.contains(&id) {
        return false;
    }
    set.push(id);
    true
}

fn remove_present(set: &mut Vec<Uuid>, id: Uuid) -> bool {
    let before = set.len();
    set.retain(|x| *x != id);
    set.len() != before
}
