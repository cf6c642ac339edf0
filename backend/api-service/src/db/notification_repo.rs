use crate::models::notification::NewNotification;
use crate::models::Notification;
use sqlx::PgPool;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, actor_id, type, content, related_id, is_read, created_at";

pub async fn create_notification(
    pool: &PgPool,
    notification: &NewNotification,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        INSERT INTO notifications (id, user_id, actor_id, type, content, related_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        NOTIFICATION_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(notification.user_id)
    .bind(notification.actor_id)
    .bind(notification.notification_type.as_str())
    .bind(&notification.content)
    .bind(notification.related_id)
    .fetch_one(pool)
    .await
}

pub async fn find_notification_by_id(
    pool: &PgPool,
    notification_id: Uuid,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {} FROM notifications WHERE id = $1",
        NOTIFICATION_COLUMNS
    ))
    .bind(notification_id)
    .fetch_optional(pool)
    .await
}

/// Notifications of a user, newest first
pub async fn find_user_notifications(
    pool: &PgPool,
    user_id: Uuid,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        SELECT {} FROM notifications
        WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
        NOTIFICATION_COLUMNS
    ))
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn set_read(
    pool: &PgPool,
    notification_id: Uuid,
    is_read: bool,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET is_read = $2 WHERE id = $1 RETURNING {}",
        NOTIFICATION_COLUMNS
    ))
    .bind(notification_id)
    .bind(is_read)
    .fetch_one(pool)
    .await
}

/// Mark every unread notification of a user as read; returns how many changed.
pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

pub async fn delete_notification(
    pool: &PgPool,
    notification_id: Uuid,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "DELETE FROM notifications WHERE id = $1 RETURNING {}",
        NOTIFICATION_COLUMNS
    ))
    .bind(notification_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
