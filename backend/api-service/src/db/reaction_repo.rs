use crate::models::{Reaction, ReactionCount};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const REACTION_COLUMNS: &str = "id, reaction_type, user_id, post_id, created_at";

/// Result of an upsert; `inserted` is false when an existing reaction changed type
#[derive(Debug, FromRow)]
pub struct UpsertedReaction {
    #[sqlx(flatten)]
    pub reaction: Reaction,
    pub inserted: bool,
}

pub async fn find_user_reaction(
    pool: &PgPool,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<Option<Reaction>, sqlx::Error> {
    sqlx::query_as::<_, Reaction>(&format!(
        "SELECT {} FROM reactions WHERE user_id = $1 AND post_id = $2",
        REACTION_COLUMNS
    ))
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Create the user's reaction to a post or change its type.
pub async fn upsert_reaction(
    pool: &PgPool,
    user_id: Uuid,
    post_id: Uuid,
    reaction_type: &str,
) -> Result<UpsertedReaction, sqlx::Error> {
    sqlx::query_as::<_, UpsertedReaction>(&format!(
        r#"
        INSERT INTO reactions (id, reaction_type, user_id, post_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, post_id) DO UPDATE SET reaction_type = EXCLUDED.reaction_type
        RETURNING {}, (xmax = 0) AS inserted
        "#,
        REACTION_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(reaction_type)
    .bind(user_id)
    .bind(post_id)
    .fetch_one(pool)
    .await
}

pub async fn find_reactions_by_post(
    pool: &PgPool,
    post_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Reaction>, sqlx::Error> {
    sqlx::query_as::<_, Reaction>(&format!(
        r#"
        SELECT {} FROM reactions
        WHERE post_id = $1
        ORDER BY created_at
        LIMIT $2 OFFSET $3
        "#,
        REACTION_COLUMNS
    ))
    .bind(post_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Reaction totals per type for a post
pub async fn count_by_type(pool: &PgPool, post_id: Uuid) -> Result<Vec<ReactionCount>, sqlx::Error> {
    sqlx::query_as::<_, ReactionCount>(
        r#"
        SELECT reaction_type, COUNT(*) AS count
        FROM reactions
        WHERE post_id = $1
        GROUP BY reaction_type
        ORDER BY count DESC, reaction_type
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_reaction(
    pool: &PgPool,
    reaction_id: Uuid,
) -> Result<Option<Reaction>, sqlx::Error> {
    sqlx::query_as::<_, Reaction>(&format!(
        "DELETE FROM reactions WHERE id = $1 RETURNING {}",
        REACTION_COLUMNS
    ))
    .bind(reaction_id)
    .fetch_optional(pool)
    .await
}
