use crate::db::{post_repo, reaction_repo, user_repo};
use crate::error::Result;
use crate::models::{FeedItem, FeedResponse, Page};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

pub struct FeedService {
    pool: PgPool,
}

impl FeedService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Posts by the user and their friends, newest first.
    ///
    /// Counters are queried per post so a join never multiplies rows.
    pub async fn home_feed(&self, user_id: Uuid, page: Page) -> Result<FeedResponse> {
        let total = post_repo::count_feed_posts(&self.pool, user_id).await?;
        let posts = post_repo::find_feed_posts(&self.pool, user_id, page.limit, page.skip).await?;

        let mut items = Vec::with_capacity(posts.len());
        for post in posts {
            let Some(author) = user_repo::find_by_id(&self.pool, post.author_id).await? else {
                warn!(post_id = %post.id, "Skipping feed post without author");
                continue;
            };

            let comment_count = post_repo::count_comments(&self.pool, post.id).await?;
            let reaction_count = post_repo::count_reactions(&self.pool, post.id).await?;
            let own_reaction = reaction_repo::find_user_reaction(&self.pool, user_id, post.id).await?;

            items.push(FeedItem {
                post,
                author: author.into(),
                comment_count,
                reaction_count,
                has_reacted: own_reaction.is_some(),
                reaction_type: own_reaction.map(|r| r.reaction_type),
            });
        }

        Ok(FeedResponse::new(items, total, page.skip, page.limit))
    }
}
