use crate::db::user_repo::USER_COLUMNS;
use crate::models::{FriendshipRequest, User};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const REQUEST_COLUMNS: &str = "id, sender_id, receiver_id, status, created_at, updated_at";

pub async fn are_friends(pool: &PgPool, user_id: Uuid, other_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM friendships
            WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
        )
        "#,
    )
    .bind(user_id)
    .bind(other_id)
    .fetch_one(pool)
    .await
}

/// Friends of `user_id`, whichever direction the rows were stored in
pub async fn find_friends(pool: &PgPool, user_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {} FROM users
        WHERE id IN (
            SELECT friend_id FROM friendships WHERE user_id = $1
            UNION
            SELECT user_id FROM friendships WHERE friend_id = $1
        )
        AND id <> $1
        ORDER BY username
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Insert both directions of a friendship.
pub async fn insert_friendship_pair(
    conn: &mut PgConnection,
    user_id: Uuid,
    friend_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO friendships (user_id, friend_id)
        VALUES ($1, $2), ($2, $1)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(friend_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Remove both directions of a friendship and every request between the pair.
pub async fn delete_friendship_pair(
    conn: &mut PgConnection,
    user_id: Uuid,
    friend_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let removed = sqlx::query(
        r#"
        DELETE FROM friendships
        WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
        "#,
    )
    .bind(user_id)
    .bind(friend_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    sqlx::query(
        r#"
        DELETE FROM friendship_requests
        WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)
        "#,
    )
    .bind(user_id)
    .bind(friend_id)
    .execute(&mut *conn)
    .await?;

    Ok(removed)
}

/// Create the missing reverse row of every one-way friendship.
pub async fn repair_one_way_friendships(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO friendships (user_id, friend_id)
        SELECT f.friend_id, f.user_id
        FROM friendships f
        WHERE NOT EXISTS (
            SELECT 1 FROM friendships r
            WHERE r.user_id = f.friend_id AND r.friend_id = f.user_id
        )
        ON CONFLICT DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn create_request(
    pool: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> Result<FriendshipRequest, sqlx::Error> {
    sqlx::query_as::<_, FriendshipRequest>(&format!(
        r#"
        INSERT INTO friendship_requests (id, sender_id, receiver_id, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING {}
        "#,
        REQUEST_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(sender_id)
    .bind(receiver_id)
    .fetch_one(pool)
    .await
}

pub async fn find_request_by_id(
    pool: &PgPool,
    request_id: Uuid,
) -> Result<Option<FriendshipRequest>, sqlx::Error> {
    sqlx::query_as::<_, FriendshipRequest>(&format!(
        "SELECT {} FROM friendship_requests WHERE id = $1",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
}

/// Request from `sender_id` to `receiver_id` in any status
pub async fn find_request_between(
    pool: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> Result<Option<FriendshipRequest>, sqlx::Error> {
    sqlx::query_as::<_, FriendshipRequest>(&format!(
        r#"
        SELECT {} FROM friendship_requests
        WHERE sender_id = $1 AND receiver_id = $2
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        REQUEST_COLUMNS
    ))
    .bind(sender_id)
    .bind(receiver_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_received_requests(
    pool: &PgPool,
    receiver_id: Uuid,
    status: Option<&str>,
) -> Result<Vec<FriendshipRequest>, sqlx::Error> {
    sqlx::query_as::<_, FriendshipRequest>(&format!(
        r#"
        SELECT {} FROM friendship_requests
        WHERE receiver_id = $1 AND ($2::varchar IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
        REQUEST_COLUMNS
    ))
    .bind(receiver_id)
    .bind(status)
    .fetch_all(pool)
    .await
}

pub async fn find_sent_requests(
    pool: &PgPool,
    sender_id: Uuid,
    status: Option<&str>,
) -> Result<Vec<FriendshipRequest>, sqlx::Error> {
    sqlx::query_as::<_, FriendshipRequest>(&format!(
        r#"
        SELECT {} FROM friendship_requests
        WHERE sender_id = $1 AND ($2::varchar IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
        REQUEST_COLUMNS
    ))
    .bind(sender_id)
    .bind(status)
    .fetch_all(pool)
    .await
}

/// Set the status of a request that is still pending.
///
/// Returns `None` when the request was answered concurrently.
pub async fn answer_request(
    conn: &mut PgConnection,
    request_id: Uuid,
    status: &str,
) -> Result<Option<FriendshipRequest>, sqlx::Error> {
    sqlx::query_as::<_, FriendshipRequest>(&format!(
        r#"
        UPDATE friendship_requests SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {}
        "#,
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .bind(status)
    .fetch_optional(conn)
    .await
}

pub async fn delete_request(
    pool: &PgPool,
    request_id: Uuid,
) -> Result<Option<FriendshipRequest>, sqlx::Error> {
    sqlx::query_as::<_, FriendshipRequest>(&format!(
        "DELETE FROM friendship_requests WHERE id = $1 RETURNING {}",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
}
