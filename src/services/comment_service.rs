//! Comment service

use super::authorization::{found, require, Action, AuthorizationPolicy, Resource};
use crate::{
    error::AppError,
    models::{
        comment::{CommentDto, CreateCommentRequest, NewComment, UpdateCommentRequest},
        post::{VoteRequest, VoteResponse},
    },
    repository::Store,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    store: Arc<dyn Store>,
    policy: Arc<dyn AuthorizationPolicy>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        Self { store, policy }
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        req: CreateCommentRequest,
    ) -> Result<CommentDto, AppError> {
        found(self.store.find_post(req.post_id).await?, "Post")?;

        if let Some(reply_to_id) = req.reply_to_id {
            let parent = found(self.store.find_comment(reply_to_id).await?, "Comment")?;
            if parent.post_id != req.post_id {
                return Err(AppError::validation(
                    "replyToId must reference a comment on the same post",
                ));
            }
        }

        let comment = self
            .store
            .create_comment(NewComment {
                post_id: req.post_id,
                author_id,
                content: req.content,
                reply_to_id: req.reply_to_id,
            })
            .await?;

        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment created");
        Ok(comment.into())
    }

    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentDto>, AppError> {
        found(self.store.find_post(post_id).await?, "Post")?;
        let comments = self.store.list_comments_for_post(post_id).await?;

        Ok(comments.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        subject: Uuid,
        id: Uuid,
        req: UpdateCommentRequest,
    ) -> Result<CommentDto, AppError> {
        let comment = found(self.store.find_comment(id).await?, "Comment")?;
        require(self.policy.as_ref(), subject, Action::Edit, Resource::Comment(&comment))?;

        let comment = found(self.store.update_comment(id, req.content).await?, "Comment")?;
        Ok(comment.into())
    }

    pub async fn delete(&self, subject: Uuid, id: Uuid) -> Result<(), AppError> {
        let comment = found(self.store.find_comment(id).await?, "Comment")?;
        require(self.policy.as_ref(), subject, Action::Delete, Resource::Comment(&comment))?;

        if !self.store.delete_comment(id).await? {
            return Err(AppError::not_found("Comment"));
        }

        tracing::info!(comment_id = %id, "Comment deleted");
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

        let comment = found(self.store.find_comment(id).await?, "Comment")?;
        require(self.policy.as_ref(), subject, Action::Vote, Resource::Comment(&comment))?;

        let reputation = found(self.store.apply_comment_vote(id, delta).await?, "Comment")?;
        tracing::debug!(comment_id = %id, user_id = %subject, delta, "Comment vote applied");

        Ok(VoteResponse { reputation })
    }
}
