use crate::models::{Post, PostWithCounts};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const POST_COLUMNS: &str = "id, content, media_url, author_id, created_at, updated_at";

pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    content: &str,
    media_url: Option<&str>,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO posts (id, content, media_url, author_id)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        POST_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(content)
    .bind(media_url)
    .bind(author_id)
    .fetch_one(pool)
    .await
}

pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS))
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

pub async fn post_exists(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(pool)
        .await
}

/// All posts, newest first, with comment and reaction counts
pub async fn list_posts_with_counts(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, PostWithCounts>(
        r#"
        SELECT p.id, p.content, p.media_url, p.author_id, p.created_at, p.updated_at,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM reactions r WHERE r.post_id = p.id) AS reaction_count
        FROM posts p
        ORDER BY p.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Posts by one author, newest first
pub async fn find_posts_by_author(
    pool: &PgPool,
    author_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        SELECT {} FROM posts
        WHERE author_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        POST_COLUMNS
    ))
    .bind(author_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    content: Option<&str>,
    media_url: Option<&str>,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        UPDATE posts SET
            content = COALESCE($2, content),
            media_url = COALESCE($3, media_url),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        POST_COLUMNS
    ))
    .bind(post_id)
    .bind(content)
    .bind(media_url)
    .fetch_one(pool)
    .await
}

/// Delete a post together with its reactions and comments.
pub async fn delete_post_cascade(
    conn: &mut PgConnection,
    post_id: Uuid,
) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query("DELETE FROM reactions WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query_as::<_, Post>(&format!(
        "DELETE FROM posts WHERE id = $1 RETURNING {}",
        POST_COLUMNS
    ))
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn count_comments(pool: &PgPool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
}

pub async fn count_reactions(pool: &PgPool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM reactions WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
}

/// Posts written by `user_id` or by one of their friends, newest first
pub async fn find_feed_posts(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        SELECT {} FROM posts
        WHERE author_id = $1
           OR author_id IN (SELECT friend_id FROM friendships WHERE user_id = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        POST_COLUMNS
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_feed_posts(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM posts
        WHERE author_id = $1
           OR author_id IN (SELECT friend_id FROM friendships WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Rewrite media URLs starting with `from_prefix` to start with `to_prefix`.
pub async fn rewrite_media_url_prefix(
    pool: &PgPool,
    from_prefix: &str,
    to_prefix: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET media_url = $2 || SUBSTRING(media_url FROM CHAR_LENGTH($1) + 1)
        WHERE LEFT(media_url, CHAR_LENGTH($1)) = $1
        "#,
    )
    .bind(from_prefix)
    .bind(to_prefix)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
