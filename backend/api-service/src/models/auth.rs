use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Google sign-in through a Firebase ID token
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GoogleSignInRequest {
    #[validate(length(min = 1, message = "firebase_token must not be empty"))]
    pub firebase_token: String,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: Option<String>,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

impl GoogleSignInRequest {
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidationResponse {
    pub valid: bool,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
}

/// Diagnostic view of the Firebase setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseStatusResponse {
    pub environment: String,
    pub service_account_path: String,
    pub service_account_file_exists: bool,
    pub firebase_service_account_env_exists: bool,
    pub firebase_initialized: bool,
    pub project_id: Option<String>,
    pub api_key_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_and_normalization() {
        let req: GoogleSignInRequest = serde_json::from_str(
            r#"{"firebase_token": "tok", "email": "  Ada@Uni.EDU "}"#,
        )
        .unwrap();
        assert!(!req.refresh);
        assert_eq!(req.normalized_email().as_deref(), Some("ada@uni.edu"));
    }

    #[test]
    fn test_request_rejects_bad_email() {
        let req = GoogleSignInRequest {
            firebase_token: "tok".to_string(),
            email: Some("nope".to_string()),
            name: None,
            photo_url: None,
            refresh: false,
        };
        assert!(req.validate().is_err());
    }
}
