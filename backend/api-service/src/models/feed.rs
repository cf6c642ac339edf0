use super::{Post, UserResponse};
use serde::{Deserialize, Serialize};

/// One post in the home feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub post: Post,
    pub author: UserResponse,
    pub comment_count: i64,
    pub reaction_count: i64,
    pub has_reacted: bool,
    pub reaction_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    pub total: i64,
    pub has_more: bool,
}

impl FeedResponse {
    pub fn new(items: Vec<FeedItem>, total: i64, skip: i64, limit: i64) -> Self {
        Self {
            items,
            total,
            has_more: total > skip + limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more() {
        assert!(FeedResponse::new(Vec::new(), 45, 20, 20).has_more);
        assert!(!FeedResponse::new(Vec::new(), 40, 20, 20).has_more);
        assert!(!FeedResponse::new(Vec::new(), 0, 0, 20).has_more);
    }
}
