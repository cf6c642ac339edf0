//! Request and authentication logging middleware

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::Error;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::time::Instant;
use tracing::{info, warn};

/// Logs method, path, query, status and duration of every request.
pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingService { service }))
    }
}

pub struct RequestLoggingService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query = req.query_string().to_string();

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            info!(
                %method,
                %path,
                %query,
                status = res.status().as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );
            Ok(res)
        })
    }
}

/// Warns about unauthenticated user requests and rejected credentials.
pub struct AuthLogging;

impl<S, B> Transform<S, ServiceRequest> for AuthLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthLoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthLoggingService { service }))
    }
}

pub struct AuthLoggingService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthLoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let has_auth = req.headers().contains_key(AUTHORIZATION);
        if path.contains("/users/") && !has_auth {
            warn!(%path, "User endpoint requested without Authorization header");
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                warn!(%path, status = status.as_u16(), has_auth, "Authentication rejected");
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_logging_middlewares_preserve_status() {
        let app = test::init_service(
            App::new()
                .wrap(AuthLogging)
                .wrap(RequestLogging)
                .route("/users/me", web::get().to(|| async { HttpResponse::Forbidden().finish() }))
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/users/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ok?x=1").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
