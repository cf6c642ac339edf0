/// Firebase ID token verification
///
/// Tokens are RS256 JWTs signed with Google's `securetoken` keys. Keys are
/// fetched from the public JWKS endpoint and cached for the `max-age` the
/// endpoint advertises.
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

pub const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_KEY_TTL_SECS: i64 = 3600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FirebaseError {
    #[error("Firebase is not configured")]
    NotConfigured,
    #[error("Invalid Firebase token: {0}")]
    Malformed(String),
    #[error("Invalid Firebase token: unexpected algorithm {0}")]
    UnexpectedAlgorithm(String),
    #[error("Invalid Firebase token: no signing key for kid {0}")]
    UnknownKey(String),
    #[error("Could not fetch Firebase signing keys: {0}")]
    KeyFetch(String),
    #[error("Firebase token has expired")]
    Expired,
    #[error("Invalid Firebase token: {0}")]
    Invalid(String),
}

/// Claims of a verified Firebase ID token
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Default)]
struct KeyCache {
    keys: HashMap<String, Jwk>,
    expires_at: Option<DateTime<Utc>>,
}

impl KeyCache {
    fn is_fresh(&self) -> bool {
        self.expires_at.map(|t| Utc::now() < t).unwrap_or(false)
    }
}

pub struct FirebaseVerifier {
    project_id: Option<String>,
    http: Client,
    cache: RwLock<KeyCache>,
}

impl FirebaseVerifier {
    pub fn new(project_id: Option<String>) -> Self {
        Self {
            project_id,
            http: Client::new(),
            cache: RwLock::new(KeyCache::default()),
        }
    }

    /// Whether a project id is known, i.e. tokens can be checked at all
    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Verify signature, issuer, audience, expiry and subject of an ID token.
    pub async fn verify_id_token(&self, token: &str) -> Result<FirebaseClaims, FirebaseError> {
        let project_id = self.project_id.as_deref().ok_or(FirebaseError::NotConfigured)?;

        let header = decode_header(token).map_err(|e| FirebaseError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(FirebaseError::UnexpectedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| FirebaseError::Malformed("missing key id".to_string()))?;

        let jwk = self.signing_key(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| FirebaseError::Invalid(e.to_string()))?;

        let issuer = format!("https://securetoken.google.com/{}", project_id);
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[project_id]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let data = decode::<FirebaseClaims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => FirebaseError::Expired,
                ErrorKind::InvalidIssuer => FirebaseError::Invalid("wrong issuer".to_string()),
                ErrorKind::InvalidAudience => FirebaseError::Invalid("wrong audience".to_string()),
                ErrorKind::InvalidSignature => {
                    FirebaseError::Invalid("signature verification failed".to_string())
                }
                _ => FirebaseError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(FirebaseError::Invalid("empty subject".to_string()));
        }

        debug!(uid = %data.claims.sub, "Verified Firebase ID token");
        Ok(data.claims)
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk, FirebaseError> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh() {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        let (keys, ttl) = self.fetch_keys().await?;

        let mut cache = self.cache.write().await;
        cache.keys = keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
        cache.expires_at = Some(Utc::now() + ttl);

        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| FirebaseError::UnknownKey(kid.to_string()))
    }

    async fn fetch_keys(&self) -> Result<(Vec<Jwk>, Duration), FirebaseError> {
        let response = self
            .http
            .get(SECURETOKEN_JWKS_URL)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to fetch Firebase JWKS: {}", e);
                FirebaseError::KeyFetch(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(FirebaseError::KeyFetch(format!(
                "JWKS request failed: {}",
                response.status()
            )));
        }

        let ttl = max_age(
            response
                .headers()
                .get(reqwest::header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
        );

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| FirebaseError::KeyFetch(e.to_string()))?;

        info!(keys = jwks.keys.len(), ttl_secs = ttl.num_seconds(), "Fetched Firebase signing keys");
        Ok((jwks.keys, ttl))
    }
}

/// `max-age` of a Cache-Control header, one hour when absent.
fn max_age(cache_control: Option<&str>) -> Duration {
    cache_control
        .into_iter()
        .flat_map(|v| v.split(','))
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<i64>().ok())
        .map(Duration::seconds)
        .unwrap_or_else(|| Duration::seconds(DEFAULT_KEY_TTL_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_age() {
        assert_eq!(
            max_age(Some("public, max-age=19204, must-revalidate, no-transform")),
            Duration::seconds(19204)
        );
        assert_eq!(max_age(Some("no-cache")), Duration::seconds(3600));
        assert_eq!(max_age(None), Duration::seconds(3600));
    }

    #[tokio::test]
    async fn test_unconfigured_verifier_rejects() {
        let verifier = FirebaseVerifier::new(None);
        assert!(!verifier.is_configured());
        assert_eq!(
            verifier.verify_id_token("a.b.c").await.unwrap_err(),
            FirebaseError::NotConfigured
        );
    }

    #[tokio::test]
    async fn test_malformed_token_rejected_before_key_fetch() {
        let verifier = FirebaseVerifier::new(Some("crush-test".to_string()));
        let err = verifier.verify_id_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, FirebaseError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_hmac_token_rejected() {
        let keys = crypto_core::JwtKeys::from_secret("secret", "HS256", 5).unwrap();
        let token = keys.generate_access_token(uuid::Uuid::new_v4()).unwrap();

        let verifier = FirebaseVerifier::new(Some("crush-test".to_string()));
        let err = verifier.verify_id_token(&token).await.unwrap_err();
        assert!(matches!(err, FirebaseError::UnexpectedAlgorithm(_)));
    }
}
