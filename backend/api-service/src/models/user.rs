use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// How the account authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Email,
    Google,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Email => "email",
            AuthProvider::Google => "google",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "email" => Some(AuthProvider::Email),
            "google" => Some(AuthProvider::Google),
            _ => None,
        }
    }
}

/// User row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub graduation_year: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_email_verified: bool,
    pub is_admin: bool,
    pub auth_provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn provider(&self) -> AuthProvider {
        AuthProvider::parse(&self.auth_provider).unwrap_or(AuthProvider::Email)
    }

    /// Google accounts are verified by their identity provider.
    pub fn counts_as_verified(&self) -> bool {
        self.provider() == AuthProvider::Google || self.is_verified
    }
}

/// User as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub graduation_year: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            bio: user.bio,
            profile_picture: user.profile_picture,
            university: user.university,
            department: user.department,
            graduation_year: user.graduation_year,
            is_active: user.is_active,
            is_verified: user.is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email(message = "value is not a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "username must be 1-100 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 255, message = "full_name must be 1-255 characters"))]
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    #[validate(length(max = 10, message = "graduation_year must be at most 10 characters"))]
    pub graduation_year: Option<String>,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: Option<String>,
}

/// Values needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub hashed_password: Option<String>,
    pub profile_picture: Option<String>,
    pub university: Option<String>,
    pub is_verified: bool,
    pub is_email_verified: bool,
    pub is_admin: bool,
    pub auth_provider: AuthProvider,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub exclude_friends: Option<bool>,
}

/// Paged suggestion list
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub items: Vec<UserResponse>,
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfilePictureResponse {
    pub message: String,
    pub profile_picture_url: String,
    pub storage_type: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user(provider: AuthProvider, is_verified: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "ada@uni.edu".to_string(),
            username: "ada".to_string(),
            full_name: "Ada Lovelace".to_string(),
            hashed_password: Some("$argon2id$v=19$placeholder".to_string()),
            bio: None,
            profile_picture: None,
            university: Some("Not specified".to_string()),
            department: None,
            graduation_year: None,
            is_active: true,
            is_verified,
            is_email_verified: is_verified,
            is_admin: false,
            auth_provider: provider.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::user;
    use super::*;

    #[test]
    fn test_google_users_count_as_verified() {
        assert!(user(AuthProvider::Google, false).counts_as_verified());
        assert!(!user(AuthProvider::Email, false).counts_as_verified());
        assert!(user(AuthProvider::Email, true).counts_as_verified());
    }

    #[test]
    fn test_response_omits_private_fields() {
        let json = serde_json::to_value(UserResponse::from(user(AuthProvider::Email, true))).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("hashed_password"));
        assert!(!obj.contains_key("is_admin"));
        assert!(!obj.contains_key("auth_provider"));
        assert_eq!(obj.len(), 13);
    }

    #[test]
    fn test_update_validation() {
        let bad = UserUpdate {
            email: Some("not-an-email".to_string()),
            ..UserUpdate::default()
        };
        assert!(bad.validate().is_err());

        let ok = UserUpdate {
            bio: Some("hello".to_string()),
            ..UserUpdate::default()
        };
        assert!(ok.validate().is_ok());
    }
}
