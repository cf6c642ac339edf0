//! R2 connectivity checks and migration of locally stored media.

use crate::config::API_V1_PREFIX;
use crate::db::{post_repo, user_repo};
use crate::services::storage::{content_type_for, POST_MEDIA_PREFIX, PROFILE_PICTURES_PREFIX};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use s3_utils::{R2Client, R2Config, StorageError};
use sqlx::PgPool;
use std::path::Path;
use tracing::{error, info, warn};

/// Prefixes written by the connection test and uploaded by the migration
pub const MEDIA_PREFIXES: [&str; 2] = [PROFILE_PICTURES_PREFIX, POST_MEDIA_PREFIX];
const LISTED_KEYS: usize = 5;

/// Show the first and last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Environment summary printed before connecting, secrets masked.
pub fn describe_config(config: &R2Config) -> Vec<(&'static str, String)> {
    let unset = || "<not set>".to_string();
    vec![
        ("R2_ENDPOINT", config.endpoint.clone().unwrap_or_else(unset)),
        (
            "R2_ACCESS_KEY_ID",
            config.access_key_id.as_deref().map(mask_secret).unwrap_or_else(unset),
        ),
        (
            "R2_SECRET_ACCESS_KEY",
            config
                .secret_access_key
                .as_deref()
                .map(mask_secret)
                .unwrap_or_else(unset),
        ),
        ("R2_BUCKET_NAME", config.bucket.clone()),
        ("R2_PUBLIC_URL", config.public_url.clone().unwrap_or_else(unset)),
    ]
}

#[derive(Debug, Default)]
pub struct ConnectionReport {
    pub bucket_created: bool,
    pub test_keys: Vec<String>,
    pub object_count: i32,
    pub sample_keys: Vec<String>,
}

/// Check bucket access, creating the bucket when missing, then write and list test objects.
pub async fn test_connection(client: &R2Client) -> Result<ConnectionReport> {
    let bucket = &client.config().bucket;
    if client.config().is_asia_pacific() {
        info!("Endpoint targets the Asia-Pacific jurisdiction");
    }

    let mut report = ConnectionReport::default();
    match client.health_check().await {
        Ok(()) => info!(%bucket, "Bucket is reachable"),
        Err(StorageError::BucketNotFound(_)) => {
            warn!(%bucket, "Bucket not found, creating it");
            client
                .create_bucket()
                .await
                .with_context(|| format!("failed to create bucket {}", bucket))?;
            report.bucket_created = true;
        }
        Err(StorageError::AccessDenied(_)) => {
            bail!(
                "access denied to bucket {}; check that the API token has read and write permission",
                bucket
            );
        }
        Err(e) => return Err(e).context("failed to reach R2"),
    }

    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    for prefix in MEDIA_PREFIXES {
        let key = format!("{}/test-{}.txt", prefix, stamp);
        let body = format!("R2 connection test written at {}", Utc::now().to_rfc3339());
        client
            .put_object(&key, body.into_bytes(), "text/plain")
            .await
            .with_context(|| format!("failed to write {}", key))?;
        info!(%key, "Wrote test object");
        report.test_keys.push(key);
    }

    let listed = client
        .list_objects("", 1000)
        .await
        .context("failed to list objects")?;
    report.object_count = listed.key_count;
    report.sample_keys = listed.keys.into_iter().take(LISTED_KEYS).collect();

    Ok(report)
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub uploaded: usize,
    pub failed: usize,
    pub posts_updated: u64,
    pub users_updated: u64,
}

/// Upload every file under `upload_dir/{profile_pictures,post_media}` to R2.
pub async fn upload_local_media(client: &R2Client, upload_dir: &Path) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    for prefix in MEDIA_PREFIXES {
        let dir = upload_dir.join(prefix);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(dir = %dir.display(), "Directory does not exist, skipping");
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", dir.display()))
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let key = format!("{}/{}", prefix, name);

            let uploaded = match tokio::fs::read(entry.path()).await {
                Ok(bytes) => client
                    .put_object(&key, bytes, content_type_for(&name))
                    .await
                    .map_err(anyhow::Error::from),
                Err(e) => Err(e.into()),
            };
            match uploaded {
                Ok(()) => {
                    info!(%key, "Uploaded");
                    report.uploaded += 1;
                }
                Err(e) => {
                    error!(%key, "Upload failed: {:#}", e);
                    report.failed += 1;
                }
            }
        }
    }

    Ok(report)
}

/// Point stored URLs at R2 instead of the local static route.
pub async fn rewrite_media_urls(
    pool: &PgPool,
    config: &R2Config,
    base_url: &str,
    report: &mut MigrationReport,
) -> Result<()> {
    let base_url = base_url.trim_end_matches('/');
    let from = format!("{}{}/static/", base_url, API_V1_PREFIX);
    let to = config.object_url("", base_url);

    report.posts_updated = post_repo::rewrite_media_url_prefix(pool, &from, &to)
        .await
        .context("failed to update post media URLs")?;
    report.users_updated = user_repo::rewrite_profile_picture_prefix(pool, &from, &to)
        .await
        .context("failed to update profile picture URLs")?;

    info!(
        posts = report.posts_updated,
        users = report.users_updated,
        "Rewrote media URLs"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcd1234efgh5678"), "abcd...5678");
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn test_describe_config_masks_credentials() {
        let config = R2Config {
            access_key_id: Some("AKIAEXAMPLEKEY01".to_string()),
            secret_access_key: Some("supersecretvalue99".to_string()),
            ..R2Config::default()
        };
        let described = describe_config(&config);
        let secret = &described
            .iter()
            .find(|(k, _)| *k == "R2_SECRET_ACCESS_KEY")
            .unwrap()
            .1;
        assert_eq!(secret, "supe...ue99");
        assert_eq!(described[0].1, "<not set>");
    }

    #[tokio::test]
    async fn test_upload_skips_missing_directories() {
        let dir = TempDir::new().unwrap();
        let config = R2Config {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..R2Config::default()
        };
        let client = R2Client::with_config(config).await.unwrap();

        let report = upload_local_media(&client, dir.path()).await.unwrap();
        assert_eq!(report.uploaded, 0);
        assert_eq!(report.failed, 0);
    }
}
