/// Google sign-in and access token checks
use crate::config::Config;
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::metrics::social::SIGNIN_TOTAL;
use crate::models::auth::{GoogleSignInRequest, TokenResponse, TokenValidationResponse};
use crate::models::user::{AuthProvider, NewUser, User};
use crate::services::email::EmailService;
use crate::services::firebase::FirebaseVerifier;
use crypto_core::{generate_strong_password, hash_password, JwtKeys};
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

pub const DEV_TEST_TOKEN: &str = "test_firebase_token";

/// Identity asserted by Firebase (or by a development shortcut)
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

pub struct AuthService<'a> {
    pool: &'a PgPool,
    config: &'a Config,
    firebase: &'a FirebaseVerifier,
    keys: &'a JwtKeys,
    email: &'a EmailService,
}

impl<'a> AuthService<'a> {
    pub fn new(
        pool: &'a PgPool,
        config: &'a Config,
        firebase: &'a FirebaseVerifier,
        keys: &'a JwtKeys,
        email: &'a EmailService,
    ) -> Self {
        Self {
            pool,
            config,
            firebase,
            keys,
            email,
        }
    }

    /// Exchange a Firebase ID token for an API access token.
    pub async fn google_sign_in(&self, request: &GoogleSignInRequest) -> Result<TokenResponse> {
        let result = self.sign_in(request).await;
        let outcome = if result.is_ok() { "success" } else { "rejected" };
        SIGNIN_TOTAL.with_label_values(&[outcome]).inc();
        result
    }

    async fn sign_in(&self, request: &GoogleSignInRequest) -> Result<TokenResponse> {
        request.validate()?;
        let request_email = request.normalized_email();

        let identity = self.resolve_identity(request, request_email.as_deref()).await?;
        let email = check_identity_email(
            request_email.as_deref(),
            identity.email.as_deref(),
            &self.config.auth.allowed_email_domains,
        )?;

        let user = self.get_or_create_user(&email, &identity).await?;
        if !user.is_active {
            return Err(AppError::Unauthorized("Inactive user".to_string()));
        }

        let access_token = self
            .keys
            .generate_access_token(user.id)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        info!(user_id = %user.id, "Google sign-in succeeded");
        Ok(TokenResponse::bearer(access_token))
    }

    async fn resolve_identity(
        &self,
        request: &GoogleSignInRequest,
        request_email: Option<&str>,
    ) -> Result<GoogleIdentity> {
        let development = self.config.is_development();

        if development && !self.firebase.is_configured() {
            if let Some(email) = request_email {
                warn!("DEVELOPMENT MODE: Firebase not configured, trusting sign-in request");
                return Ok(GoogleIdentity {
                    email: Some(email.to_string()),
                    name: Some(
                        request
                            .name
                            .clone()
                            .unwrap_or_else(|| "Development User".to_string()),
                    ),
                    picture: request.photo_url.clone(),
                });
            }
        }

        if development && request.firebase_token == DEV_TEST_TOKEN {
            warn!("DEVELOPMENT MODE: Using test Firebase token");
            return Ok(GoogleIdentity {
                email: Some("test@example.com".to_string()),
                name: Some("Test User".to_string()),
                picture: None,
            });
        }

        let claims = self
            .firebase
            .verify_id_token(&request.firebase_token)
            .await
            .map_err(|e| {
                warn!("Firebase token rejected: {}", e);
                AppError::Unauthorized(e.to_string())
            })?;

        Ok(GoogleIdentity {
            email: claims.email.map(|e| e.trim().to_lowercase()),
            name: claims.name,
            picture: claims.picture,
        })
    }

    async fn get_or_create_user(&self, email: &str, identity: &GoogleIdentity) -> Result<User> {
        if let Some(existing) = user_repo::find_by_email(self.pool, email).await? {
            let user =
                user_repo::link_google_account(self.pool, existing.id, identity.picture.as_deref())
                    .await?;
            return Ok(user);
        }

        let base = email.split('@').next().unwrap_or(email);
        let username = user_repo::available_username(self.pool, base).await?;
        let full_name = identity
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Google User".to_string());

        let new_user = NewUser {
            email: email.to_string(),
            username,
            full_name,
            hashed_password: Some(hash_password(&generate_strong_password(32))?),
            profile_picture: identity.picture.clone(),
            university: Some("Not specified".to_string()),
            is_verified: true,
            is_email_verified: true,
            is_admin: false,
            auth_provider: AuthProvider::Google,
        };
        let user = user_repo::create_user(self.pool, &new_user).await?;
        info!(user_id = %user.id, username = %user.username, "Created user from Google sign-in");

        if self.email.is_enabled() {
            let mailer = self.email.clone();
            let recipient = user.email.clone();
            let full_name = user.full_name.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer.send_welcome_email(&recipient, &full_name).await {
                    warn!("Failed to send welcome email: {}", e);
                }
            });
        }

        Ok(user)
    }

    /// Describe the user a bearer token belongs to.
    pub async fn validate_token(&self, token: &str) -> Result<TokenValidationResponse> {
        let user_id = self
            .keys
            .get_user_id_from_token(token)
            .map_err(|_| AppError::Unauthorized("Invalid token or token expired".to_string()))?;

        let user = user_repo::find_by_id(self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
        if !user.is_active {
            return Err(AppError::Unauthorized("Inactive user".to_string()));
        }

        Ok(TokenValidationResponse {
            valid: true,
            user_id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            is_verified: user.is_verified,
        })
    }
}

/// Reconcile the request email with the token email and apply the domain allow-list.
pub fn check_identity_email(
    request_email: Option<&str>,
    token_email: Option<&str>,
    allowed_domains: &[String],
) -> Result<String> {
    if let (Some(requested), Some(asserted)) = (request_email, token_email) {
        if !requested.eq_ignore_ascii_case(asserted) {
            return Err(AppError::Unauthorized(
                "Email mismatch between request and token".to_string(),
            ));
        }
    }

    let email = token_email
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            AppError::Unauthorized("Email is required for Google authentication".to_string())
        })?;

    if !allowed_domains.is_empty() {
        let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
        if !allowed_domains.iter().any(|allowed| allowed == domain) {
            return Err(AppError::Unauthorized("Email domain not allowed".to_string()));
        }
    }

    Ok(email)
}
