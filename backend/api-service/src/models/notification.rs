use super::UserResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Notification kinds as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    FriendRequest,
    FriendAccepted,
    PostLike,
    PostComment,
    CommentLike,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::FriendRequest => "friend_request",
            NotificationType::FriendAccepted => "friend_accepted",
            NotificationType::PostLike => "post_like",
            NotificationType::PostComment => "post_comment",
            NotificationType::CommentLike => "comment_like",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "friend_request" => Some(NotificationType::FriendRequest),
            "friend_accepted" => Some(NotificationType::FriendAccepted),
            "post_like" => Some(NotificationType::PostLike),
            "post_comment" => Some(NotificationType::PostComment),
            "comment_like" => Some(NotificationType::CommentLike),
            _ => None,
        }
    }

    /// Name used by the mobile client
    pub fn client_name(&self) -> &'static str {
        match self {
            NotificationType::FriendRequest => "friendshipRequest",
            NotificationType::FriendAccepted => "friendAccepted",
            NotificationType::PostLike => "postLike",
            NotificationType::PostComment => "postComment",
            NotificationType::CommentLike => "commentLike",
        }
    }
}

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub content: String,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert a notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub content: String,
    pub related_id: Option<Uuid>,
}

/// Notification enriched for the list view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub content: String,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub actor: Option<UserResponse>,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
}

impl NotificationResponse {
    /// Map the stored type to its client name and derive post/comment ids.
    ///
    /// `comment_post_id` is the post of the referenced comment for `post_comment`.
    pub fn new(
        notification: Notification,
        actor: Option<UserResponse>,
        comment_post_id: Option<Uuid>,
    ) -> Self {
        let kind = NotificationType::parse(&notification.notification_type);

        let (post_id, comment_id) = match kind {
            Some(NotificationType::PostLike) => (notification.related_id, None),
            Some(NotificationType::PostComment) => (comment_post_id, notification.related_id),
            _ => (None, None),
        };

        Self {
            id: notification.id,
            user_id: notification.user_id,
            actor_id: notification.actor_id,
            notification_type: kind
                .map(|k| k.client_name().to_string())
                .unwrap_or(notification.notification_type),
            content: notification.content,
            related_id: notification.related_id,
            is_read: notification.is_read,
            created_at: notification.created_at,
            actor,
            post_id,
            comment_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationUpdate {
    #[serde(default = "default_is_read")]
    pub is_read: bool,
}

fn default_is_read() -> bool {
    true
}

/// Result of a bulk notification operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkNotificationResult {
    pub message: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(kind: &str, related_id: Option<Uuid>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            actor_id: Some(Uuid::new_v4()),
            notification_type: kind.to_string(),
            content: "ada liked your post".to_string(),
            related_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_stored_type() {
        assert_eq!(NotificationType::parse("post_comment"), Some(NotificationType::PostComment));
        assert_eq!(NotificationType::parse("friendshipRequest"), None);
    }

    #[test]
    fn test_post_like_sets_post_id() {
        let post_id = Uuid::new_v4();
        let view = NotificationResponse::new(notification("post_like", Some(post_id)), None, None);
        assert_eq!(view.notification_type, "postLike");
        assert_eq!(view.post_id, Some(post_id));
        assert_eq!(view.comment_id, None);
    }

    #[test]
    fn test_post_comment_sets_both_ids() {
        let comment_id = Uuid::new_v4();
        let post_id = Uuid::new_v4();
        let view = NotificationResponse::new(
            notification("post_comment", Some(comment_id)),
            None,
            Some(post_id),
        );
        assert_eq!(view.notification_type, "postComment");
        assert_eq!(view.comment_id, Some(comment_id));
        assert_eq!(view.post_id, Some(post_id));
    }

    #[test]
    fn test_friend_types_and_unknown_passthrough() {
        let view = NotificationResponse::new(notification("friend_request", None), None, None);
        assert_eq!(view.notification_type, "friendshipRequest");
        assert_eq!(view.post_id, None);

        let view = NotificationResponse::new(notification("system", None), None, None);
        assert_eq!(view.notification_type, "system");
    }

    #[test]
    fn test_update_defaults_to_read() {
        let update: NotificationUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.is_read);
    }
}
