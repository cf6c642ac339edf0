/// Authentication handlers - Google sign-in and token checks
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::bearer_token;
use crate::models::auth::{FirebaseStatusResponse, GoogleSignInRequest};
use crate::services::{AuthService, EmailService, FirebaseVerifier};
use actix_web::{web, HttpRequest, HttpResponse};
use crypto_core::JwtKeys;
use sqlx::PgPool;
use std::path::Path;

pub async fn google_signin(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    firebase: web::Data<FirebaseVerifier>,
    keys: web::Data<JwtKeys>,
    email: web::Data<EmailService>,
    body: web::Json<GoogleSignInRequest>,
) -> Result<HttpResponse> {
    let service = AuthService::new(&pool, &config, &firebase, &keys, &email);
    let token = service.google_sign_in(&body).await?;
    Ok(HttpResponse::Ok().json(token))
}

pub async fn validate_token(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    firebase: web::Data<FirebaseVerifier>,
    keys: web::Data<JwtKeys>,
    email: web::Data<EmailService>,
) -> Result<HttpResponse> {
    let token = bearer_token(req.headers())?;
    let service = AuthService::new(&pool, &config, &firebase, &keys, &email);
    let validation = service.validate_token(token).await?;
    Ok(HttpResponse::Ok().json(validation))
}

/// Firebase setup diagnostics; hidden in production.
pub async fn firebase_status(
    config: web::Data<Config>,
    firebase: web::Data<FirebaseVerifier>,
) -> Result<HttpResponse> {
    if config.is_production() {
        return Err(AppError::Forbidden(
            "This endpoint is not available in production".to_string(),
        ));
    }

    let status = FirebaseStatusResponse {
        environment: config.app.environment.clone(),
        service_account_path: config.firebase.service_account_path.clone(),
        service_account_file_exists: Path::new(&config.firebase.service_account_path).exists(),
        firebase_service_account_env_exists: config.firebase.service_account_env_present,
        firebase_initialized: firebase.is_configured(),
        project_id: firebase.project_id().map(str::to_string),
        api_key_configured: config.firebase.api_key.is_some(),
    };
    Ok(HttpResponse::Ok().json(status))
}
