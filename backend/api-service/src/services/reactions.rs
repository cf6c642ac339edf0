use crate::db::{post_repo, reaction_repo};
use crate::error::{AppError, Result};
use crate::models::reaction::ReactionCreate;
use crate::models::{NotificationType, Page, Reaction, ReactionCount, ReactionType, User};
use crate::services::notifications::NotificationService;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

pub struct ReactionService {
    pool: PgPool,
}

impl ReactionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_post(&self, post_id: Uuid) -> Result<()> {
        if post_repo::post_exists(&self.pool, post_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Post not found".to_string()))
        }
    }

    /// Set the user's reaction to a post; the post author is notified only on first reaction.
    pub async fn react(&self, user: &User, post_id: Uuid, input: &ReactionCreate) -> Result<Reaction> {
        let reaction_type = ReactionType::parse(&input.reaction_type)?;
        let post = post_repo::find_post_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let upserted =
            reaction_repo::upsert_reaction(&self.pool, user.id, post_id, reaction_type.as_str()).await?;

        if upserted.inserted {
            NotificationService::new(self.pool.clone())
                .notify(post.author_id, user, NotificationType::PostLike, Some(post_id))
                .await;
        } else {
            debug!(post_id = %post_id, user_id = %user.id, "Changed reaction type");
        }

        Ok(upserted.reaction)
    }

    pub async fn list(&self, post_id: Uuid, page: Page) -> Result<Vec<Reaction>> {
        self.ensure_post(post_id).await?;
        Ok(reaction_repo::find_reactions_by_post(&self.pool, post_id, page.limit, page.skip).await?)
    }

    pub async fn counts(&self, post_id: Uuid) -> Result<Vec<ReactionCount>> {
        self.ensure_post(post_id).await?;
        Ok(reaction_repo::count_by_type(&self.pool, post_id).await?)
    }

    pub async fn remove(&self, user_id: Uuid, post_id: Uuid) -> Result<Reaction> {
        self.ensure_post(post_id).await?;
        let reaction = reaction_repo::find_user_reaction(&self.pool, user_id, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Reaction not found".to_string()))?;

        reaction_repo::delete_reaction(&self.pool, reaction.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Reaction not found".to_string()))
    }
}
