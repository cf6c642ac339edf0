/// Cloudflare R2 (S3-compatible) storage client
///
/// Wraps the AWS S3 SDK with R2 endpoint and credential handling, object key
/// conventions and typed errors.
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::{info, warn};

pub mod config;
pub mod operations;

pub use config::R2Config;
pub use operations::{ListedObjects, StoredObject};

/// Storage errors surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("R2 is not configured; missing: {}", .0.join(", "))]
    NotConfigured(Vec<&'static str>),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("access denied to bucket {0}")]
    AccessDenied(String),
    #[error("URL does not point into the bucket: {0}")]
    UnrecognizedUrl(String),
    #[error("storage request failed: {0}")]
    Request(String),
}

/// HTTP status of a failed SDK call, when the service answered at all.
pub(crate) fn sdk_status<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

/// Render an SDK error with its service code and message when available.
pub(crate) fn describe<E>(err: &SdkError<E, HttpResponse>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            format!(
                "{}: {}",
                inner.code().unwrap_or("Unknown"),
                inner.message().unwrap_or("no message")
            )
        }
        other => other.to_string(),
    }
}

/// Shared R2 client wrapper
#[derive(Clone)]
pub struct R2Client {
    client: Arc<Client>,
    config: R2Config,
}

impl std::fmt::Debug for R2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R2Client")
            .field("bucket", &self.config.bucket)
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}

impl R2Client {
    /// Build a client from environment configuration.
    ///
    /// Returns `StorageError::NotConfigured` when endpoint or credentials are missing.
    pub async fn from_env() -> Result<Self, StorageError> {
        Self::with_config(R2Config::from_env()).await
    }

    /// Build a client with an explicit configuration.
    pub async fn with_config(config: R2Config) -> Result<Self, StorageError> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            return Err(StorageError::NotConfigured(missing));
        }

        let (Some(endpoint), Some(access_key_id), Some(secret_access_key)) = (
            config.endpoint.as_deref(),
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
        ) else {
            return Err(StorageError::NotConfigured(config.missing_settings()));
        };

        if !config.is_asia_pacific() {
            warn!(
                endpoint = %endpoint,
                "R2 endpoint is not an Asia-Pacific (.ap.) endpoint"
            );
        }

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "campus_crush_r2",
        );

        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        info!(bucket = %config.bucket, "R2 client initialized");

        Ok(Self {
            client: Arc::new(Client::from_conf(s3_config)),
            config,
        })
    }

    /// Get reference to underlying S3 client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &R2Config {
        &self.config
    }

    /// Verify the bucket is reachable with the configured credentials.
    pub async fn health_check(&self) -> Result<(), StorageError> {
        match self
            .client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => match sdk_status(&err) {
                Some(404) => Err(StorageError::BucketNotFound(self.config.bucket.clone())),
                Some(403) => Err(StorageError::AccessDenied(self.config.bucket.clone())),
                _ => Err(StorageError::Request(describe(&err))),
            },
        }
    }

    /// Create the configured bucket.
    pub async fn create_bucket(&self) -> Result<(), StorageError> {
        self.client
            .create_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Request(describe(&e)))?;

        info!(bucket = %self.config.bucket, "Created R2 bucket");
        Ok(())
    }
}
