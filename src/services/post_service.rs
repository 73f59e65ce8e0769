//! Post service

use super::authorization::{found, require, Action, AuthorizationPolicy, Resource};
use crate::{
    error::AppError,
    models::{
        post::{
            CreatePostRequest, ListPostsQuery, NewPost, PaginatedPostsResponse, PostChanges,
            PostDetailDto, PostDto, PostFilter, UpdatePostRequest, VoteRequest, VoteResponse,
        },
    },
    repository::Store,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct PostService {
    store: Arc<dyn Store>,
    policy: Arc<dyn AuthorizationPolicy>,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        Self { store, policy }
    }

    pub async fn create(&self, author_id: Uuid, req: CreatePostRequest) -> Result<PostDto, AppError> {
        if let Some(group_id) = req.group_id {
            found(self.store.find_group(group_id).await?, "Group")?;
        }

        let post = self
            .store
            .create_post(NewPost {
                author_id,
                content: req.content,
                media_urls: req.media_urls,
                group_id: req.group_id,
            })
            .await?;

        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post.into())
    }

    pub async fn list(&self, query: ListPostsQuery) -> Result<PaginatedPostsResponse, AppError> {
        let filter = PostFilter::from(query);
        let (posts, total_count) = self.store.list_posts(&filter).await?;

        Ok(PaginatedPostsResponse {
            posts: posts.into_iter().map(PostDto::from).collect(),
            page: filter.page,
            limit: filter.limit,
            total_count,
        })
    }

    pub async fn detail(&self, id: Uuid) -> Result<PostDetailDto, AppError> {
        let post = found(self.store.find_post(id).await?, "Post")?;
        let comments = self.store.list_comments_for_post(id).await?;

        Ok(PostDetailDto {
            post: post.into(),
            comments: comments.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn update(
        &self,
        subject: Uuid,
        id: Uuid,
        req: UpdatePostRequest,
    ) -> Result<PostDto, AppError> {
        let post = found(self.store.find_post(id).await?, "Post")?;
        require(self.policy.as_ref(), subject, Action::Edit, Resource::Post(&post))?;

        let changes = PostChanges {
            content: req.content,
            media_urls: req.media_urls,
        };
        let post = found(self.store.update_post(id, changes).await?, "Post")?;

        Ok(post.into())
    }

    pub async fn delete(&self, subject: Uuid, id: Uuid) -> Result<(), AppError> {
        let post = found(self.store.find_post(id).await?, "Post")?;
        require(self.policy.as_ref(), subject, Action::Delete, Resource::Post(&post))?;

        if !self.store.delete_post(id).await? {
            return Err(AppError::not_found("Post"));
        }

        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    pub async fn vote(
        &self,
        subject: Uuid,
        id: Uuid,
        req: VoteRequest,
    ) -> Result<VoteResponse, AppError> {
        let delta = req
            .delta()
            .ok_or_else(|| AppError::validation("value must be 1 or -1"))?;

        let post = found(self.store.find_post(id).await?, "Post")?;
        require(self.policy.as_ref(), subject, Action::Vote, Resource::Post(&post))?;

        let reputation = found(self.store.apply_post_vote(id, delta).await?, "Post")?;
        tracing::debug!(post_id = %id, user_id = %subject, delta, "Post vote applied");

        Ok(VoteResponse { reputation })
    }
}
