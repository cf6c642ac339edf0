/// Notification fan-out for social events and the notification inbox
use crate::db::{comment_repo, notification_repo, user_repo};
use crate::error::{AppError, Result};
use crate::metrics::social::NOTIFICATIONS_TOTAL;
use crate::models::notification::{BulkNotificationResult, NewNotification};
use crate::models::{Notification, NotificationResponse, NotificationType, User, UserResponse};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an event for `recipient_id`. Never fails; errors are logged.
    ///
    /// Events a user triggers on their own content are skipped.
    pub async fn notify(
        &self,
        recipient_id: Uuid,
        actor: &User,
        kind: NotificationType,
        related_id: Option<Uuid>,
    ) -> Option<Notification> {
        if recipient_id == actor.id {
            debug!(user_id = %actor.id, kind = kind.as_str(), "Skipping self notification");
            return None;
        }

        let notification = NewNotification {
            user_id: recipient_id,
            actor_id: Some(actor.id),
            notification_type: kind,
            content: event_content(kind, &actor.username),
            related_id,
        };

        match notification_repo::create_notification(&self.pool, &notification).await {
            Ok(created) => {
                NOTIFICATIONS_TOTAL
                    .with_label_values(&[kind.as_str(), "created"])
                    .inc();
                Some(created)
            }
            Err(e) => {
                NOTIFICATIONS_TOTAL
                    .with_label_values(&[kind.as_str(), "error"])
                    .inc();
                error!(
                    recipient = %recipient_id,
                    kind = kind.as_str(),
                    "Failed to create notification: {}", e
                );
                None
            }
        }
    }

    /// Inbox of `user_id`, newest first, with actor and post/comment ids resolved.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationResponse>> {
        let notifications =
            notification_repo::find_user_notifications(&self.pool, user_id, unread_only, limit, offset)
                .await?;

        let mut items = Vec::with_capacity(notifications.len());
        for notification in notifications {
            let actor = match notification.actor_id {
                Some(actor_id) => user_repo::find_by_id(&self.pool, actor_id)
                    .await?
                    .map(UserResponse::from),
                None => None,
            };

            let comment_post_id = match (
                NotificationType::parse(&notification.notification_type),
                notification.related_id,
            ) {
                (Some(NotificationType::PostComment), Some(comment_id)) => {
                    comment_repo::find_post_id(&self.pool, comment_id).await?
                }
                _ => None,
            };

            items.push(NotificationResponse::new(notification, actor, comment_post_id));
        }

        Ok(items)
    }

    pub async fn mark(&self, user_id: Uuid, notification_id: Uuid, is_read: bool) -> Result<Notification> {
        self.owned(user_id, notification_id).await?;
        Ok(notification_repo::set_read(&self.pool, notification_id, is_read).await?)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<BulkNotificationResult> {
        let count = notification_repo::mark_all_read(&self.pool, user_id).await?;
        Ok(BulkNotificationResult {
            message: format!("Marked {} notifications as read", count),
            count,
        })
    }

    pub async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification> {
        self.owned(user_id, notification_id).await?;
        notification_repo::delete_notification(&self.pool, notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    pub async fn delete_all(&self, user_id: Uuid) -> Result<BulkNotificationResult> {
        let count = notification_repo::delete_all_for_user(&self.pool, user_id).await?;
        Ok(BulkNotificationResult {
            message: format!("Deleted {} notifications", count),
            count,
        })
    }

    async fn owned(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification> {
        let notification = notification_repo::find_notification_by_id(&self.pool, notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden("Not enough permissions".to_string()));
        }
        Ok(notification)
    }
}

/// Text shown for an event triggered by `username`
pub fn event_content(kind: NotificationType, username: &str) -> String {
    match kind {
        NotificationType::PostLike => format!("{} liked your post", username),
        NotificationType::PostComment => format!("{} commented on your post", username),
        NotificationType::FriendRequest => format!("{} sent you a friend request", username),
        NotificationType::FriendAccepted => format!("{} accepted your friend request", username),
        NotificationType::CommentLike => format!("{} liked your comment", username),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_content() {
        assert_eq!(
            event_content(NotificationType::PostLike, "ada"),
            "ada liked your post"
        );
        assert_eq!(
            event_content(NotificationType::PostComment, "ada"),
            "ada commented on your post"
        );
        assert_eq!(
            event_content(NotificationType::FriendRequest, "ada"),
            "ada sent you a friend request"
        );
        assert_eq!(
            event_content(NotificationType::FriendAccepted, "ada"),
            "ada accepted your friend request"
        );
    }
}
