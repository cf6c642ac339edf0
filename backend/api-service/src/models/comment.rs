use super::UserResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Comment row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_edited(&self) -> bool {
        self.updated_at > self.created_at
    }
}

/// Comment as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Option<UserResponse>,
    /// Comment likes are not tracked; always 0
    pub like_count: i64,
    pub has_liked: bool,
    pub replies_count: i64,
    pub is_edited: bool,
}

impl CommentResponse {
    pub fn new(comment: Comment, author: Option<UserResponse>, replies_count: i64) -> Self {
        let is_edited = comment.is_edited();
        Self {
            id: comment.id,
            content: comment.content,
            author_id: comment.author_id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            author,
            like_count: 0,
            has_liked: false,
            replies_count,
            is_edited,
        }
    }
}

/// Top-level comment with its replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithReplies {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentCreate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentUpdate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
}
