use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Post row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub content: String,
    pub media_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post plus engagement counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostWithCounts {
    pub id: Uuid,
    pub content: String,
    pub media_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comment_count: i64,
    pub reaction_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostUpdate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
    pub media_url: Option<String>,
}

/// Result of the debug media probe
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaCheckResponse {
    pub filename: String,
    pub key: String,
    pub r2_configured: bool,
    pub exists_in_r2: bool,
    pub exists_locally: bool,
    pub url: Option<String>,
}
