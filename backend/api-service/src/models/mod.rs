/// Data models for the Campus Crush API
///
/// Row types (`FromRow`) mirror the tables; request and response types are
/// the JSON contract of the REST surface.
pub mod auth;
pub mod comment;
pub mod feed;
pub mod friendship;
pub mod notification;
pub mod post;
pub mod reaction;
pub mod user;

pub use comment::{Comment, CommentResponse, CommentWithReplies};
pub use feed::{FeedItem, FeedResponse};
pub use friendship::{FriendshipRequest, FriendshipStatus, RequestStatus};
pub use notification::{Notification, NotificationResponse, NotificationType};
pub use post::{Post, PostWithCounts};
pub use reaction::{Reaction, ReactionCount, ReactionType};
pub use user::{AuthProvider, User, UserResponse};

use crate::error::{AppError, Result};
use serde::Deserialize;

/// `skip`/`limit` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl PaginationParams {
    /// Apply the endpoint's default and maximum `limit`.
    pub fn window(&self, default_limit: i64, max_limit: i64) -> Result<Page> {
        let skip = self.skip.unwrap_or(0);
        if skip < 0 {
            return Err(AppError::ValidationError(
                "skip must be greater than or equal to 0".to_string(),
            ));
        }

        let limit = self.limit.unwrap_or(default_limit);
        if limit < 1 || limit > max_limit {
            return Err(AppError::ValidationError(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }

        Ok(Page { skip, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults() {
        let page = PaginationParams::default().window(20, 50).unwrap();
        assert_eq!(page, Page { skip: 0, limit: 20 });
    }

    #[test]
    fn test_window_bounds() {
        let params = PaginationParams {
            skip: Some(10),
            limit: Some(50),
        };
        assert_eq!(params.window(20, 50).unwrap(), Page { skip: 10, limit: 50 });

        let too_big = PaginationParams {
            skip: None,
            limit: Some(51),
        };
        assert!(too_big.window(20, 50).is_err());

        let zero = PaginationParams {
            skip: None,
            limit: Some(0),
        };
        assert!(zero.window(20, 50).is_err());

        let negative_skip = PaginationParams {
            skip: Some(-1),
            limit: None,
        };
        assert!(negative_skip.window(20, 50).is_err());
    }
}
