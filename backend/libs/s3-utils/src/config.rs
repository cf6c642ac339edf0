/// R2 configuration and object key conventions
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_BUCKET: &str = "campuscrush-media";

#[derive(Clone, Serialize, Deserialize)]
pub struct R2Config {
    /// S3 API endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    pub bucket: String,
    /// Public (CDN) base URL; objects are served through the API proxy when unset
    pub public_url: Option<String>,
    /// R2 ignores regions, the SDK still requires one
    pub region: String,
}

impl fmt::Debug for R2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("R2Config")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "[SET]"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .finish()
    }
}

impl Default for R2Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
            public_url: None,
            region: "auto".to_string(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl R2Config {
    /// Load R2 configuration from `R2_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            endpoint: non_empty_env("R2_ENDPOINT").map(|e| e.trim_end_matches('/').to_string()),
            access_key_id: non_empty_env("R2_ACCESS_KEY_ID"),
            secret_access_key: non_empty_env("R2_SECRET_ACCESS_KEY"),
            bucket: non_empty_env("R2_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            public_url: non_empty_env("R2_PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string()),
            region: "auto".to_string(),
        }
    }

    /// Names of the required variables that are not set.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.endpoint.is_none() {
            missing.push("R2_ENDPOINT");
        }
        if self.access_key_id.is_none() {
            missing.push("R2_ACCESS_KEY_ID");
        }
        if self.secret_access_key.is_none() {
            missing.push("R2_SECRET_ACCESS_KEY");
        }
        missing
    }

    pub fn is_configured(&self) -> bool {
        self.missing_settings().is_empty()
    }

    /// Whether the endpoint targets the Asia-Pacific jurisdiction.
    pub fn is_asia_pacific(&self) -> bool {
        self.endpoint
            .as_deref()
            .map(|e| e.contains(".ap."))
            .unwrap_or(false)
    }

    /// Public URL of `key`: the CDN URL when configured, otherwise the API media proxy.
    pub fn object_url(&self, key: &str, api_base_url: &str) -> String {
        match &self.public_url {
            Some(public_url) => format!("{}/{}", public_url, key),
            None => format!("{}/api/v1/media/{}", api_base_url.trim_end_matches('/'), key),
        }
    }

    /// Inverse of [`object_url`](Self::object_url).
    pub fn key_from_url(&self, url: &str, api_base_url: &str) -> Option<String> {
        let proxy_prefix = format!("{}/api/v1/media/", api_base_url.trim_end_matches('/'));

        let key = match &self.public_url {
            Some(public_url) if url.starts_with(&format!("{}/", public_url)) => {
                &url[public_url.len() + 1..]
            }
            _ if url.starts_with(&proxy_prefix) => &url[proxy_prefix.len()..],
            _ => return None,
        };

        (!key.is_empty()).then(|| key.to_string())
    }
}

/// Fresh object key `{prefix}/{uuid-hex}{extension}`; `extension` includes its dot.
pub fn new_object_key(prefix: &str, extension: &str) -> String {
    format!(
        "{}/{}{}",
        prefix.trim_matches('/'),
        Uuid::new_v4().simple(),
        extension.to_ascii_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_public_url() -> R2Config {
        R2Config {
            public_url: Some("https://cdn.campuscrush.app".to_string()),
            ..R2Config::default()
        }
    }

    #[test]
    fn test_object_url_prefers_public_url() {
        let url = config_with_public_url()
            .object_url("post_media/abc.jpg", "https://api.example.com");
        assert_eq!(url, "https://cdn.campuscrush.app/post_media/abc.jpg");
    }

    #[test]
    fn test_object_url_falls_back_to_proxy() {
        let url = R2Config::default().object_url("post_media/abc.jpg", "https://api.example.com/");
        assert_eq!(url, "https://api.example.com/api/v1/media/post_media/abc.jpg");
    }

    #[test]
    fn test_key_from_url_accepts_both_forms() {
        let config = config_with_public_url();
        let base = "https://api.example.com";

        assert_eq!(
            config.key_from_url("https://cdn.campuscrush.app/post_media/a.png", base),
            Some("post_media/a.png".to_string())
        );
        assert_eq!(
            config.key_from_url("https://api.example.com/api/v1/media/profile_pictures/b.jpg", base),
            Some("profile_pictures/b.jpg".to_string())
        );
        assert_eq!(config.key_from_url("https://elsewhere.com/x.png", base), None);
        assert_eq!(config.key_from_url("https://cdn.campuscrush.app/", base), None);
    }

    #[test]
    fn test_new_object_key_shape() {
        let key = new_object_key("post_media", ".JPG");
        assert!(key.starts_with("post_media/"));
        assert!(key.ends_with(".jpg"));
        // prefix + '/' + 32 hex chars + ".jpg"
        assert_eq!(key.len(), "post_media/".len() + 32 + 4);
    }

    #[test]
    fn test_missing_settings_and_region_check() {
        let config = R2Config::default();
        assert_eq!(
            config.missing_settings(),
            vec!["R2_ENDPOINT", "R2_ACCESS_KEY_ID", "R2_SECRET_ACCESS_KEY"]
        );
        assert!(!config.is_configured());

        let ap = R2Config {
            endpoint: Some("https://acct.ap.r2.cloudflarestorage.com".to_string()),
            ..R2Config::default()
        };
        assert!(ap.is_asia_pacific());
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_trims_and_defaults() {
        std::env::set_var("R2_ENDPOINT", "https://acct.r2.cloudflarestorage.com/");
        std::env::set_var("R2_PUBLIC_URL", "  ");
        std::env::remove_var("R2_BUCKET_NAME");

        let config = R2Config::from_env();
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://acct.r2.cloudflarestorage.com")
        );
        assert_eq!(config.public_url, None);
        assert_eq!(config.bucket, DEFAULT_BUCKET);

        std::env::remove_var("R2_ENDPOINT");
        std::env::remove_var("R2_PUBLIC_URL");
    }

    #[test]
    fn test_debug_masks_secret() {
        let config = R2Config {
            secret_access_key: Some("very-secret".to_string()),
            ..R2Config::default()
        };
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
