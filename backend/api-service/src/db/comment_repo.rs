use crate::models::Comment;
use sqlx::PgPool;
use uuid::Uuid;

const COMMENT_COLUMNS: &str = "id, content, author_id, post_id, parent_id, created_at, updated_at";

pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
    parent_id: Option<Uuid>,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        INSERT INTO comments (id, content, author_id, post_id, parent_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        COMMENT_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(content)
    .bind(author_id)
    .bind(post_id)
    .bind(parent_id)
    .fetch_one(pool)
    .await
}

pub async fn find_comment_by_id(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE id = $1",
        COMMENT_COLUMNS
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Top-level comments of a post, newest first
pub async fn find_top_level_comments(
    pool: &PgPool,
    post_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {} FROM comments
        WHERE post_id = $1 AND parent_id IS NULL
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        COMMENT_COLUMNS
    ))
    .bind(post_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Direct replies to a comment, oldest first
pub async fn find_replies(
    pool: &PgPool,
    parent_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {} FROM comments
        WHERE parent_id = $1
        ORDER BY created_at ASC
        LIMIT $2 OFFSET $3
        "#,
        COMMENT_COLUMNS
    ))
    .bind(parent_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_replies(pool: &PgPool, parent_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_id = $1")
        .bind(parent_id)
        .fetch_one(pool)
        .await
}

/// Newest comment of any depth on a post
pub async fn find_latest_comment(
    pool: &PgPool,
    post_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {} FROM comments
        WHERE post_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        COMMENT_COLUMNS
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_comment_content(
    pool: &PgPool,
    comment_id: Uuid,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        UPDATE comments SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        COMMENT_COLUMNS
    ))
    .bind(comment_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// Delete a comment; its replies go with it through `ON DELETE CASCADE`.
pub async fn delete_comment(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "DELETE FROM comments WHERE id = $1 RETURNING {}",
        COMMENT_COLUMNS
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Post a comment belongs to
pub async fn find_post_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT post_id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(pool)
        .await
}
