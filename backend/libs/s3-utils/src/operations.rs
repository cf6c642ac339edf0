/// Object operations on the R2 bucket
use crate::{describe, sdk_status, R2Client, StorageError};
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

/// Object body and content type returned by [`R2Client::get_object`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListedObjects {
    pub key_count: i32,
    pub keys: Vec<String>,
}

impl R2Client {
    /// Upload `body` under `key`.
    pub async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = body.len();
        self.client()
            .put_object()
            .bucket(&self.config().bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Request(describe(&e)))?;

        debug!(%key, size, "Uploaded object");
        Ok(())
    }

    /// Download an object. Missing keys map to `StorageError::NotFound`.
    pub async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let response = self
            .client()
            .get_object()
            .bucket(&self.config().bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match sdk_status(&e) {
                Some(404) => StorageError::NotFound(key.to_string()),
                _ => StorageError::Request(describe(&e)),
            })?;

        let content_type = response.content_type().map(|s| s.to_string());
        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(StoredObject {
            bytes: body.into_bytes().to_vec(),
            content_type,
        })
    }

    pub async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client()
            .delete_object()
            .bucket(&self.config().bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Request(describe(&e)))?;

        debug!(%key, "Deleted object");
        Ok(())
    }

    pub async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client()
            .head_object()
            .bucket(&self.config().bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if sdk_status(&e) == Some(404) => Ok(false),
            Err(e) => Err(StorageError::Request(describe(&e))),
        }
    }

    /// List up to `max_keys` objects under `prefix` (all objects when `prefix` is empty).
    pub async fn list_objects(
        &self,
        prefix: &str,
        max_keys: i32,
    ) -> Result<ListedObjects, StorageError> {
        let mut request = self
            .client()
            .list_objects_v2()
            .bucket(&self.config().bucket)
            .max_keys(max_keys);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Request(describe(&e)))?;

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(|k| k.to_string()))
            .collect();

        Ok(ListedObjects {
            key_count: response.key_count().unwrap_or(keys.len() as i32),
            keys,
        })
    }
}
