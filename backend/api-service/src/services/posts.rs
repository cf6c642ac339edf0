/// Post service - creation with optional media, edits and cascading deletes
use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::models::post::{MediaCheckResponse, PostUpdate};
use crate::models::{Page, Post, PostWithCounts};
use crate::services::storage::{
    allowed_extension, content_type_for, MediaStorage, POST_MEDIA_EXTENSIONS, POST_MEDIA_PREFIX,
};
use s3_utils::config::new_object_key;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// File uploaded alongside a post
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct PostService {
    pool: PgPool,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, post_id: Uuid) -> Result<Post> {
        post_repo::find_post_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// 404 unless the post exists
    pub async fn ensure_exists(&self, post_id: Uuid) -> Result<()> {
        if post_repo::post_exists(&self.pool, post_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Post not found".to_string()))
        }
    }

    pub async fn list(&self, page: Page) -> Result<Vec<PostWithCounts>> {
        Ok(post_repo::list_posts_with_counts(&self.pool, page.limit, page.skip).await?)
    }

    pub async fn list_by_author(&self, author_id: Uuid, page: Page) -> Result<Vec<Post>> {
        Ok(post_repo::find_posts_by_author(&self.pool, author_id, page.limit, page.skip).await?)
    }

    pub async fn create(
        &self,
        storage: &MediaStorage,
        author_id: Uuid,
        content: &str,
        media: Option<MediaUpload>,
    ) -> Result<Post> {
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("content must not be empty".to_string()));
        }

        let media_url = match media {
            Some(upload) => {
                let extension = allowed_extension(&upload.filename, POST_MEDIA_EXTENSIONS)?;
                let key = new_object_key(POST_MEDIA_PREFIX, &extension);
                let stored = storage
                    .store(&key, upload.bytes, content_type_for(&key))
                    .await
                    .map_err(|e| {
                        error!("Post media upload failed: {}", e);
                        AppError::Storage("Failed to upload media".to_string())
                    })?;
                info!(%key, storage = stored.storage.label(), "Stored post media");
                Some(stored.url)
            }
            None => None,
        };

        let post = post_repo::create_post(&self.pool, author_id, content, media_url.as_deref()).await?;
        info!(post_id = %post.id, author_id = %author_id, "Created post");
        Ok(post)
    }

    /// Update a post owned by `user_id`.
    pub async fn update(&self, user_id: Uuid, post_id: Uuid, update: PostUpdate) -> Result<Post> {
        update.validate()?;
        let post = self.get(post_id).await?;
        if post.author_id != user_id {
            return Err(AppError::Forbidden("Not enough permissions".to_string()));
        }

        Ok(post_repo::update_post(
            &self.pool,
            post_id,
            update.content.as_deref(),
            update.media_url.as_deref(),
        )
        .await?)
    }

    /// Delete a post owned by `user_id` with its reactions and comments.
    pub async fn delete(&self, storage: &MediaStorage, user_id: Uuid, post_id: Uuid) -> Result<Post> {
        let post = self.get(post_id).await?;
        if post.author_id != user_id {
            return Err(AppError::Forbidden("Not enough permissions".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let deleted = post_repo::delete_post_cascade(&mut *tx, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        tx.commit().await?;

        if let Some(media_url) = deleted.media_url.as_deref() {
            if let Err(e) = storage.delete_by_url(media_url).await {
                warn!(post_id = %post_id, "Failed to remove post media: {}", e);
            }
        }

        info!(post_id = %post_id, "Deleted post");
        Ok(deleted)
    }

    /// Where `post_media/{filename}` is stored.
    pub async fn check_media(&self, storage: &MediaStorage, filename: &str) -> Result<MediaCheckResponse> {
        let key = format!("{}/{}", POST_MEDIA_PREFIX, filename);
        let (exists_in_r2, exists_locally) = storage.exists(&key).await?;

        let url = if exists_in_r2 {
            Some(storage.r2_url(&key))
        } else if exists_locally {
            Some(storage.local_url(&key))
        } else {
            None
        };

        Ok(MediaCheckResponse {
            filename: filename.to_string(),
            key,
            r2_configured: storage.r2_enabled(),
            exists_in_r2,
            exists_locally,
            url,
        })
    }
}
