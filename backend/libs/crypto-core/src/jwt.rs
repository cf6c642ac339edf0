//! Access token issuing and validation.
//!
//! Tokens are signed with a shared secret using one of the HMAC algorithms
//! (`HS256`, `HS384`, `HS512`). The subject claim carries the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default lifetime of an access token: seven days.
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 10_080;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("JWT secret must not be empty")]
    EmptySecret,
    #[error("failed to sign token: {0}")]
    Encode(String),
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("invalid subject in token")]
    InvalidSubject,
}

/// JWT claims issued by the API.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

/// Signing and verification keys plus token policy.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    expire_minutes: i64,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

/// Parse an algorithm name such as `HS256`. Only HMAC algorithms are accepted.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(JwtError::UnsupportedAlgorithm(other.to_string())),
    }
}

impl JwtKeys {
    pub fn from_secret(
        secret: &str,
        algorithm: &str,
        expire_minutes: i64,
    ) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EmptySecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: parse_algorithm(algorithm)?,
            expire_minutes,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn expire_minutes(&self) -> i64 {
        self.expire_minutes
    }

    /// Issue an access token for `user_id` using the configured lifetime.
    pub fn generate_access_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.generate_token_with_expiry(user_id, Duration::minutes(self.expire_minutes))
    }

    /// Issue a token with an explicit lifetime. Negative lifetimes produce expired tokens.
    pub fn generate_token_with_expiry(
        &self,
        user_id: Uuid,
        lifetime: Duration,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| JwtError::Encode(e.to_string()))
    }

    /// Verify signature, algorithm and expiry.
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
    }

    /// Validate the token and parse its subject as a user id.
    pub fn get_user_id_from_token(&self, token: &str) -> Result<Uuid, JwtError> {
        let data = self.validate_token(token)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| JwtError::InvalidSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::from_secret("test-secret", "HS256", 60).unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let keys = keys();
        let user_id = Uuid::new_v4();

        let token = keys.generate_access_token(user_id).unwrap();
        let data = keys.validate_token(&token).unwrap();

        assert_eq!(data.claims.sub, user_id.to_string());
        assert!(data.claims.exp > data.claims.iat);
        assert_eq!(keys.get_user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_token_lifetime_follows_config() {
        let keys = JwtKeys::from_secret("test-secret", "HS256", DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES)
            .unwrap();
        let token = keys.generate_access_token(Uuid::new_v4()).unwrap();
        let claims = keys.validate_token(&token).unwrap().claims;

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let token = keys
            .generate_token_with_expiry(Uuid::new_v4(), Duration::minutes(-5))
            .unwrap();

        assert_eq!(keys.validate_token(&token).unwrap_err(), JwtError::Expired);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys().generate_access_token(Uuid::new_v4()).unwrap();
        let other = JwtKeys::from_secret("another-secret", "HS256", 60).unwrap();

        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let token = JwtKeys::from_secret("test-secret", "HS512", 60)
            .unwrap()
            .generate_access_token(Uuid::new_v4())
            .unwrap();

        assert!(keys().validate_token(&token).is_err());
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(
            keys().get_user_id_from_token(&token).unwrap_err(),
            JwtError::InvalidSubject
        );
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("hs384").unwrap(), Algorithm::HS384);
        assert!(matches!(
            parse_algorithm("RS256"),
            Err(JwtError::UnsupportedAlgorithm(_))
        ));
        assert_eq!(
            JwtKeys::from_secret("", "HS256", 60).unwrap_err(),
            JwtError::EmptySecret
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", keys());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("test-secret"));
    }
}
