//! Permanent removal of a user and everything they touched.

use crate::db::user_repo;
use crate::services::storage::{safe_relative_path, PROFILE_PICTURES_PREFIX};
use crate::config::API_V1_PREFIX;
use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Rows removed per table, in deletion order
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub user_id: Option<Uuid>,
    pub deleted: Vec<(&'static str, u64)>,
    pub removed_picture: bool,
}

/// Statements run in order; each binds the user id as `$1`.
const PURGE_STEPS: &[(&str, &str)] = &[
    (
        "reactions",
        "DELETE FROM reactions WHERE user_id = $1 OR post_id IN (SELECT id FROM posts WHERE author_id = $1)",
    ),
    (
        "comments",
        "DELETE FROM comments WHERE author_id = $1 OR post_id IN (SELECT id FROM posts WHERE author_id = $1)",
    ),
    ("posts", "DELETE FROM posts WHERE author_id = $1"),
    (
        "notifications",
        "DELETE FROM notifications WHERE user_id = $1 OR actor_id = $1",
    ),
    (
        "friendship_requests",
        "DELETE FROM friendship_requests WHERE sender_id = $1 OR receiver_id = $1",
    ),
    (
        "friendships",
        "DELETE FROM friendships WHERE user_id = $1 OR friend_id = $1",
    ),
];

async fn purge_rows(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<(&'static str, u64)>> {
    let mut deleted = Vec::with_capacity(PURGE_STEPS.len() + 1);
    for (table, sql) in PURGE_STEPS {
        let result = sqlx::query(sql)
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to delete from {}", table))?;
        deleted.push((*table, result.rows_affected()));
    }

    let users = user_repo::delete_user(&mut *conn, user_id).await?;
    deleted.push(("users", users));
    Ok(deleted)
}

/// Key of a profile picture served from the local static directory.
pub fn local_picture_key(url: &str) -> Option<&str> {
    let marker = format!("{}/static/", API_V1_PREFIX);
    let start = url.find(&marker)? + marker.len();
    let key = &url[start..];
    key.starts_with(PROFILE_PICTURES_PREFIX).then_some(key)
}

/// Delete the user with `email` (case-insensitive) in one transaction.
///
/// Returns an empty report when no such user exists.
pub async fn delete_user_by_email(pool: &PgPool, upload_dir: &Path, email: &str) -> Result<PurgeReport> {
    let Some(user) = user_repo::find_by_email(pool, email.trim()).await? else {
        warn!(%email, "No user with this email");
        return Ok(PurgeReport::default());
    };

    let mut tx = pool.begin().await?;
    let deleted = purge_rows(&mut *tx, user.id).await?;
    tx.commit().await.context("failed to commit user deletion")?;
    info!(user_id = %user.id, "Deleted user and related data");

    let mut removed_picture = false;
    if let Some(key) = user.profile_picture.as_deref().and_then(local_picture_key) {
        let path = upload_dir.join(safe_relative_path(key)?);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed_picture = true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), "Failed to remove profile picture: {}", e),
        }
    }

    Ok(PurgeReport {
        user_id: Some(user.id),
        deleted,
        removed_picture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_picture_key() {
        assert_eq!(
            local_picture_key("https://api.example.com/api/v1/static/profile_pictures/abc.png"),
            Some("profile_pictures/abc.png")
        );
        assert_eq!(
            local_picture_key("https://cdn.example.com/profile_pictures/abc.png"),
            None
        );
        assert_eq!(local_picture_key("https://x/api/v1/static/post_media/a.png"), None);
    }

    #[test]
    fn test_purge_order_ends_with_graph_tables() {
        let tables: Vec<&str> = PURGE_STEPS.iter().map(|(t, _)| *t).collect();
        assert_eq!(tables.first(), Some(&"reactions"));
        assert!(tables.iter().position(|t| *t == "comments") < tables.iter().position(|t| *t == "posts"));
        assert_eq!(tables.last(), Some(&"friendships"));
    }
}
