/// HTTP middleware for the Campus Crush API
///
/// Bearer authentication for protected scopes, user extractors for handlers,
/// Prometheus request metrics and request/auth logging.
pub mod logging;
pub mod metrics;

pub use logging::{AuthLogging, RequestLogging};
pub use metrics::MetricsMiddleware;

use crate::db::user_repo;
use crate::error::AppError;
use crate::models::User;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use crypto_core::JwtKeys;
use futures_util::future::LocalBoxFuture;
use sqlx::PgPool;
use std::future::{ready, Ready};
use std::ops::Deref;
use std::rc::Rc;
use uuid::Uuid;

// =====================================================================
// JWT Authentication
// =====================================================================

/// Authenticated user id, stored in request extensions by `JwtAuthMiddleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let not_authenticated = || AppError::Unauthorized("Not authenticated".to_string());

    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(not_authenticated)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(not_authenticated()),
    }
}

/// Resolve the user id carried by the request's bearer token.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Uuid, AppError> {
    let token = bearer_token(headers)?;
    keys.get_user_id_from_token(token)
        .map_err(|_| AppError::Forbidden("Could not validate credentials".to_string()))
}

/// Actix middleware that validates the bearer token against the app's `JwtKeys`.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let outcome = match req.app_data::<web::Data<JwtKeys>>() {
                Some(keys) => authenticate(req.headers(), keys),
                None => Err(AppError::Internal("JWT keys are not configured".to_string())),
            };

            match outcome {
                Ok(user_id) => {
                    req.extensions_mut().insert(UserId(user_id));
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => Ok(req.into_response(err.error_response()).map_into_right_body()),
            }
        })
    }
}

impl FromRequest for UserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string())),
        )
    }
}

// =====================================================================
// User extractors
// =====================================================================

/// Active user behind the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Active user that is verified (Google accounts always are).
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl Deref for VerifiedUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

async fn load_active_user(req: &HttpRequest) -> Result<User, AppError> {
    let user_id = req
        .extensions()
        .get::<UserId>()
        .copied()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
    let pool = req
        .app_data::<web::Data<PgPool>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("Database pool is not configured".to_string()))?;

    let user = user_repo::find_by_id(pool.get_ref(), user_id.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".to_string()));
    }
    Ok(user)
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { load_active_user(&req).await.map(CurrentUser) })
    }
}

impl FromRequest for VerifiedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let user = load_active_user(&req).await?;
            if !user.counts_as_verified() {
                return Err(AppError::Forbidden("Email not verified".to_string()));
            }
            Ok(VerifiedUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;
    use actix_web::http::StatusCode;
    use actix_web::{test, App, HttpResponse};
    use chrono::Duration;

    fn keys() -> JwtKeys {
        JwtKeys::from_secret("middleware-test-secret", "HS256", 30).unwrap()
    }

    async fn whoami(user_id: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user_id.0.to_string())
    }

    #[::core::prelude::v1::test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers).unwrap_err().detail(), "Not authenticated");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }

    #[actix_web::test]
    async fn test_missing_header_is_401() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(keys()))
                .service(web::scope("/p").wrap(JwtAuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/p/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get("www-authenticate").unwrap(), "Bearer");

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Not authenticated");
    }

    #[actix_web::test]
    async fn test_bad_and_expired_tokens_are_403() {
        let keys = keys();
        let expired = keys
            .generate_token_with_expiry(Uuid::new_v4(), Duration::minutes(-5))
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(keys))
                .service(web::scope("/p").wrap(JwtAuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        for token in ["not-a-jwt", expired.as_str()] {
            let req = test::TestRequest::get()
                .uri("/p/me")
                .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["detail"], "Could not validate credentials");
        }
    }

    #[actix_web::test]
    async fn test_valid_token_sets_user_id() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.generate_access_token(user_id).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(keys))
                .service(web::scope("/p").wrap(JwtAuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/p/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert_eq!(body, user_id.to_string());
    }
}
