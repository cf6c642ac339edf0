/// Media storage: Cloudflare R2 first, local upload directory as fallback
use crate::config::{Config, API_V1_PREFIX};
use crate::error::{AppError, Result};
use crate::metrics::social::MEDIA_UPLOADS_TOTAL;
use s3_utils::{R2Client, R2Config, StorageError};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const PROFILE_PICTURES_PREFIX: &str = "profile_pictures";
pub const POST_MEDIA_PREFIX: &str = "post_media";

pub const PROFILE_PICTURE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];
pub const POST_MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".mp4", ".mov"];

/// Where an upload ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    R2,
    Local,
}

impl StorageKind {
    pub fn label(&self) -> &'static str {
        match self {
            StorageKind::R2 => "Cloudflare R2",
            StorageKind::Local => "local storage",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub key: String,
    pub url: String,
    pub storage: StorageKind,
}

/// Bytes of a stored file and the content type to serve them with
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Clone)]
pub struct MediaStorage {
    r2: Option<R2Client>,
    r2_config: R2Config,
    upload_dir: PathBuf,
    base_url: String,
}

impl MediaStorage {
    /// Build storage from configuration; R2 stays disabled when incomplete or unreachable.
    pub async fn from_config(config: &Config) -> Self {
        let r2_config = config.storage.r2.clone();
        let missing = r2_config.missing_settings();

        let r2 = if missing.is_empty() {
            match R2Client::with_config(r2_config.clone()).await {
                Ok(client) => {
                    info!(bucket = %r2_config.bucket, "R2 storage enabled");
                    Some(client)
                }
                Err(e) => {
                    error!("Failed to initialize R2 client, using local storage: {}", e);
                    None
                }
            }
        } else {
            warn!(
                missing = %missing.join(", "),
                "R2 storage not configured; media will be stored locally"
            );
            None
        };

        Self {
            r2,
            r2_config,
            upload_dir: config.storage.upload_directory.clone(),
            base_url: config.app.base_url.clone(),
        }
    }

    /// Local-only storage rooted at `upload_dir`.
    pub fn local(upload_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            r2: None,
            r2_config: R2Config::default(),
            upload_dir: upload_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn r2_enabled(&self) -> bool {
        self.r2.is_some()
    }

    pub fn r2_client(&self) -> Option<&R2Client> {
        self.r2.as_ref()
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// URL under which a locally stored file is served
    pub fn local_url(&self, key: &str) -> String {
        format!("{}{}/static/{}", self.base_url, API_V1_PREFIX, key)
    }

    /// Public URL of an object stored in R2
    pub fn r2_url(&self, key: &str) -> String {
        self.r2_config.object_url(key, &self.base_url)
    }

    /// Store `bytes` under `key`, in R2 when possible and locally otherwise.
    pub async fn store(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredMedia> {
        if let Some(r2) = &self.r2 {
            match r2.put_object(key, bytes.clone(), content_type).await {
                Ok(()) => {
                    MEDIA_UPLOADS_TOTAL.with_label_values(&["r2"]).inc();
                    return Ok(StoredMedia {
                        key: key.to_string(),
                        url: self.r2_url(key),
                        storage: StorageKind::R2,
                    });
                }
                Err(e) => {
                    warn!(%key, "R2 upload failed, falling back to local storage: {}", e);
                }
            }
        }

        let path = self.local_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), "Stored media locally");
        MEDIA_UPLOADS_TOTAL.with_label_values(&["local"]).inc();

        Ok(StoredMedia {
            key: key.to_string(),
            url: self.local_url(key),
            storage: StorageKind::Local,
        })
    }

    /// Read a file from R2, falling back to the upload directory.
    pub async fn fetch(&self, key: &str) -> Result<MediaFile> {
        let relative = safe_relative_path(key)?;

        if let Some(r2) = &self.r2 {
            match r2.get_object(key).await {
                Ok(object) => {
                    let content_type = object
                        .content_type
                        .filter(|ct| !ct.is_empty() && ct != "binary/octet-stream")
                        .unwrap_or_else(|| content_type_for(key).to_string());
                    return Ok(MediaFile {
                        bytes: object.bytes,
                        content_type,
                    });
                }
                Err(StorageError::NotFound(_)) => {
                    debug!(%key, "Not in R2, trying local storage");
                }
                Err(e) => {
                    warn!(%key, "R2 read failed, trying local storage: {}", e);
                }
            }
        }

        self.fetch_local_path(&relative).await
    }

    /// Read a file from the upload directory only.
    pub async fn fetch_local(&self, key: &str) -> Result<MediaFile> {
        let relative = safe_relative_path(key)?;
        self.fetch_local_path(&relative).await
    }

    async fn fetch_local_path(&self, relative: &Path) -> Result<MediaFile> {
        let path = self.upload_dir.join(relative);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(MediaFile {
                bytes,
                content_type: content_type_for(&relative.to_string_lossy()).to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `key` exists in R2 and in the upload directory.
    pub async fn exists(&self, key: &str) -> Result<(bool, bool)> {
        let in_r2 = match &self.r2 {
            Some(r2) => r2.object_exists(key).await.unwrap_or_else(|e| {
                warn!(%key, "R2 existence check failed: {}", e);
                false
            }),
            None => false,
        };
        let locally = tokio::fs::try_exists(self.local_path(key)?)
            .await
            .unwrap_or(false);
        Ok((in_r2, locally))
    }

    /// Remove the file an upload URL points to.
    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        if let Some(key) = self.r2_config.key_from_url(url, &self.base_url) {
            return match &self.r2 {
                Some(r2) => Ok(r2.delete_object(&key).await?),
                None => Err(AppError::Storage(
                    "R2 is not configured; cannot delete remote media".to_string(),
                )),
            };
        }

        let local_prefix = self.local_url("");
        if let Some(key) = url.strip_prefix(&local_prefix).filter(|k| !k.is_empty()) {
            let path = self.local_path(key)?;
            return match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        Err(StorageError::UnrecognizedUrl(url.to_string()).into())
    }

    fn local_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.upload_dir.join(safe_relative_path(key)?))
    }
}

/// Reject absolute paths and any `..` component.
pub fn safe_relative_path(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let safe = !path.is_empty()
        && !path.contains("..")
        && candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if safe {
        Ok(candidate.to_path_buf())
    } else {
        Err(AppError::BadRequest("Invalid file path".to_string()))
    }
}

/// Lowercase extension of `filename` including the dot.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Extension of `filename` if it is one of `allowed`, else a 400 listing them.
pub fn allowed_extension(filename: &str, allowed: &[&str]) -> Result<String> {
    match extension_of(filename) {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(ext),
        _ => Err(AppError::BadRequest(format!(
            "Unsupported file format. Please use one of: {}",
            allowed.join(", ")
        ))),
    }
}

/// Content type guessed from the file extension
pub fn content_type_for(path: &str) -> &'static str {
    match extension_of(path).as_deref() {
        Some(".jpg") | Some(".jpeg") => "image/jpeg",
        Some(".png") => "image/png",
        Some(".gif") => "image/gif",
        Some(".mp4") => "video/mp4",
        Some(".mov") => "video/quicktime",
        Some(".txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_safe_relative_path() {
        assert!(safe_relative_path("post_media/a.png").is_ok());
        assert!(safe_relative_path("../etc/passwd").is_err());
        assert!(safe_relative_path("post_media/../../x").is_err());
        assert!(safe_relative_path("/etc/passwd").is_err());
        assert!(safe_relative_path("").is_err());
    }

    #[test]
    fn test_allowed_extension() {
        assert_eq!(
            allowed_extension("Me.JPG", PROFILE_PICTURE_EXTENSIONS).unwrap(),
            ".jpg"
        );
        let err = allowed_extension("clip.mp4", PROFILE_PICTURE_EXTENSIONS).unwrap_err();
        assert_eq!(
            err.detail(),
            "Unsupported file format. Please use one of: .jpg, .jpeg, .png"
        );
        assert!(allowed_extension("noext", POST_MEDIA_EXTENSIONS).is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a/b.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("x.MOV"), "video/quicktime");
        assert_eq!(content_type_for("x.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_local_store_fetch_delete() {
        let dir = TempDir::new().unwrap();
        let storage = MediaStorage::local(dir.path(), "http://localhost:8000/");

        let stored = storage
            .store("post_media/abc.png", b"png-bytes".to_vec(), "image/png")
            .await
            .unwrap();
        assert_eq!(stored.storage, StorageKind::Local);
        assert_eq!(
            stored.url,
            "http://localhost:8000/api/v1/static/post_media/abc.png"
        );

        let file = storage.fetch("post_media/abc.png").await.unwrap();
        assert_eq!(file.bytes, b"png-bytes");
        assert_eq!(file.content_type, "image/png");

        assert_eq!(storage.exists("post_media/abc.png").await.unwrap(), (false, true));

        storage.delete_by_url(&stored.url).await.unwrap();
        let err = storage.fetch_local("post_media/abc.png").await.unwrap_err();
        assert_eq!(err.detail(), "File not found");
    }

    #[test]
    fn test_fetch_local_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = MediaStorage::local(dir.path(), "http://localhost:8000");
        let err = tokio_test::block_on(storage.fetch_local("../secret.txt")).unwrap_err();
        assert_eq!(err.detail(), "Invalid file path");
    }

    #[tokio::test]
    async fn test_delete_rejects_foreign_urls() {
        let dir = TempDir::new().unwrap();
        let storage = MediaStorage::local(dir.path(), "http://localhost:8000");
        assert!(storage
            .delete_by_url("https://elsewhere.example/x.png")
            .await
            .is_err());
    }
}
