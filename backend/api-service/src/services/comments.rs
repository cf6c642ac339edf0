use crate::db::{comment_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::comment::{CommentCreate, CommentUpdate};
use crate::models::{Comment, CommentResponse, CommentWithReplies, NotificationType, Page, User};
use crate::services::notifications::NotificationService;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Replies embedded in a comment listing
const EMBEDDED_REPLY_LIMIT: i64 = 100;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_post(&self, post_id: Uuid) -> Result<()> {
        if post_repo::post_exists(&self.pool, post_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Post not found".to_string()))
        }
    }

    async fn get(&self, comment_id: Uuid) -> Result<Comment> {
        comment_repo::find_comment_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }

    /// Comment of `post_id` written by `user_id`
    async fn owned(&self, user_id: Uuid, post_id: Uuid, comment_id: Uuid) -> Result<Comment> {
        self.ensure_post(post_id).await?;
        let comment = self.get(comment_id).await?;
        if comment.post_id != post_id {
            return Err(AppError::BadRequest(
                "Comment does not belong to the specified post".to_string(),
            ));
        }
        if comment.author_id != user_id {
            return Err(AppError::Forbidden("Not enough permissions".to_string()));
        }
        Ok(comment)
    }

    async fn with_author(&self, comment: Comment, replies_count: i64) -> Result<CommentResponse> {
        let author = user_repo::find_by_id(&self.pool, comment.author_id)
            .await?
            .map(Into::into);
        Ok(CommentResponse::new(comment, author, replies_count))
    }

    pub async fn create(&self, author: &User, post_id: Uuid, input: CommentCreate) -> Result<CommentResponse> {
        input.validate()?;
        let post = post_repo::find_post_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if let Some(parent_id) = input.parent_id {
            let parent = self.get(parent_id).await?;
            if parent.post_id != post_id {
                return Err(AppError::BadRequest(
                    "Comment does not belong to the specified post".to_string(),
                ));
            }
        }

        let comment = comment_repo::create_comment(
            &self.pool,
            post_id,
            author.id,
            &input.content,
            input.parent_id,
        )
        .await?;
        info!(comment_id = %comment.id, post_id = %post_id, "Created comment");

        NotificationService::new(self.pool.clone())
            .notify(post.author_id, author, NotificationType::PostComment, Some(comment.id))
            .await;

        self.with_author(comment, 0).await
    }

    /// Top-level comments, newest first, each with its replies oldest first.
    pub async fn list(&self, post_id: Uuid, page: Page) -> Result<Vec<CommentWithReplies>> {
        self.ensure_post(post_id).await?;
        let comments =
            comment_repo::find_top_level_comments(&self.pool, post_id, page.limit, page.skip).await?;

        let mut result = Vec::with_capacity(comments.len());
        for comment in comments {
            let reply_rows =
                comment_repo::find_replies(&self.pool, comment.id, EMBEDDED_REPLY_LIMIT, 0).await?;
            let mut replies = Vec::with_capacity(reply_rows.len());
            for reply in reply_rows {
                replies.push(self.with_author(reply, 0).await?);
            }

            let replies_count = comment_repo::count_replies(&self.pool, comment.id).await?;
            result.push(CommentWithReplies {
                comment: self.with_author(comment, replies_count).await?,
                replies,
            });
        }
        Ok(result)
    }

    pub async fn latest(&self, post_id: Uuid) -> Result<CommentResponse> {
        self.ensure_post(post_id).await?;
        let comment = comment_repo::find_latest_comment(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No comments found for this post".to_string()))?;
        let replies_count = comment_repo::count_replies(&self.pool, comment.id).await?;
        self.with_author(comment, replies_count).await
    }

    pub async fn replies(&self, post_id: Uuid, comment_id: Uuid, page: Page) -> Result<Vec<CommentResponse>> {
        self.ensure_post(post_id).await?;
        let parent = self.get(comment_id).await?;
        if parent.post_id != post_id {
            return Err(AppError::BadRequest(
                "Comment does not belong to the specified post".to_string(),
            ));
        }

        let rows = comment_repo::find_replies(&self.pool, comment_id, page.limit, page.skip).await?;
        let mut replies = Vec::with_capacity(rows.len());
        for reply in rows {
            let count = comment_repo::count_replies(&self.pool, reply.id).await?;
            replies.push(self.with_author(reply, count).await?);
        }
        Ok(replies)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
        input: CommentUpdate,
    ) -> Result<CommentResponse> {
        input.validate()?;
        self.owned(user_id, post_id, comment_id).await?;
        let updated = comment_repo::update_comment_content(&self.pool, comment_id, &input.content).await?;
        let replies_count = comment_repo::count_replies(&self.pool, comment_id).await?;
        self.with_author(updated, replies_count).await
    }

    /// Delete an own comment; its replies go with it.
    pub async fn delete(&self, user_id: Uuid, post_id: Uuid, comment_id: Uuid) -> Result<CommentResponse> {
        self.owned(user_id, post_id, comment_id).await?;
        let deleted = comment_repo::delete_comment(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        info!(comment_id = %comment_id, "Deleted comment");
        self.with_author(deleted, 0).await
    }
}
