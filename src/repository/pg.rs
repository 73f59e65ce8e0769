//! PostgreSQL storage backend (数据库访问层)

use super::{CommentRepository, GroupRepository, PostRepository, Store, UserRepository};
use crate::{
    db::{self, HealthStatus},
    error::Result,
    models::{
        comment::{Comment, NewComment},
        group::{Group, GroupChanges, GroupRoster, NewGroup},
        post::{NewPost, Post, PostChanges, PostFilter, PostSort},
        user::{NewUser, User, UserChanges},
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE nickname = $1")
            .bind(nickname)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ANY($1) ORDER BY registered_at",
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (nickname, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                nickname = COALESCE($2, nickname),
                banner_url = COALESCE($3, banner_url),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.nickname)
        .bind(&changes.banner_url)
        .bind(&changes.password_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, content, media_urls, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(post.author_id)
        .bind(&post.content)
        .bind(&post.media_urls)
        .bind(post.group_id)
        .fetch_one(&self.db)
        .await?;

        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(post)
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<(Vec<Post>, i64)> {
        // Fixed strings only; never interpolate caller input
        let order_by = match filter.sort {
            PostSort::CreatedAt => "created_at DESC, id DESC",
            PostSort::Reputation => "reputation DESC, created_at DESC",
        };

        let sql = format!(
            r#"
            SELECT * FROM posts
            WHERE ($1::uuid IS NULL OR group_id = $1)
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order_by
        );

        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(filter.group_id)
            .bind(filter.limit)
            .bind(filter.offset())
            .fetch_all(&self.db)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE ($1::uuid IS NULL OR group_id = $1)",
        )
        .bind(filter.group_id)
        .fetch_one(&self.db)
        .await?;

        Ok((posts, total))
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET
                content = COALESCE($2, content),
                media_urls = COALESCE($3, media_urls)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.content)
        .bind(&changes.media_urls)
        .fetch_optional(&self.db)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        // comments go with ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_post_vote(&self, id: Uuid, delta: i64) -> Result<Option<i64>> {
        let mut tx = self.db.begin().await?;

        let row: Option<(i64, Uuid)> = sqlx::query_as(
            "UPDATE posts SET reputation = reputation + $2 WHERE id = $1 RETURNING reputation, author_id",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((reputation, author_id)) = row else {
            return Ok(None);
        };

        sqlx::query("UPDATE users SET reputation_posts = reputation_posts + $2 WHERE id = $1")
            .bind(author_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(reputation))
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, content, reply_to_id, is_reply)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.reply_to_id)
        .bind(comment.reply_to_id.is_some())
        .fetch_one(&self.db)
        .await?;

        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(comment)
    }

    async fn list_comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;

        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, content: String) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&content)
        .fetch_optional(&self.db)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        // replies are detached by ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_comment_vote(&self, id: Uuid, delta: i64) -> Result<Option<i64>> {
        let mut tx = self.db.begin().await?;

        let row: Option<(i64, Uuid)> = sqlx::query_as(
            "UPDATE comments SET reputation = reputation + $2 WHERE id = $1 RETURNING reputation, author_id",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((reputation, author_id)) = row else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE users SET reputation_comments = reputation_comments + $2 WHERE id = $1",
        )
        .bind(author_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(reputation))
    }
}

#[async_trait]
impl GroupRepository for PgStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tx = self.db.begin().await?;

        let created = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (group_name, description, banner_url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&group.group_name)
        .bind(&group.description)
        .bind(&group.banner_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_moderators (group_id, user_id) VALUES ($1, $2)")
            .bind(created.id)
            .bind(group.creator_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(created.id)
            .bind(group.creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY registered_at ASC")
            .fetch_all(&self.db)
            .await?;

        Ok(groups)
    }

    async fn update_group(&self, id: Uuid, changes: GroupChanges) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET
                group_name = COALESCE($2, group_name),
                description = COALESCE($3, description),
                banner_url = COALESCE($4, banner_url)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.group_name)
        .bind(&changes.description)
        .bind(&changes.banner_url)
        .fetch_optional(&self.db)
        .await?;

        Ok(group)
    }

    async fn delete_group(&self, id: Uuid) -> Result<bool> {
        // roster rows cascade, posts.group_id is set to NULL
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn group_roster(&self, id: Uuid) -> Result<GroupRoster> {
        let moderators: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM group_moderators WHERE group_id = $1 ORDER BY added_at",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        let members: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM group_members WHERE group_id = $1 ORDER BY joined_at",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(GroupRoster {
            moderators,
            members,
        })
    }

    async fn add_moderator(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO group_moderators (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_moderator(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        // Serialise roster changes of this group
        sqlx::query("SELECT id FROM groups WHERE id = $1 FOR UPDATE")
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            DELETE FROM group_moderators
            WHERE group_id = $1 AND user_id = $2
              AND (SELECT COUNT(*) FROM group_moderators WHERE group_id = $1) > 1
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
                .bind(group_id)
                .bind(user_id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> HealthStatus {
        db::health_check(&self.db).await
    }
}
