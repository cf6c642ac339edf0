//! Prometheus metrics for the Campus Crush API.
//!
//! HTTP collectors are fed by `MetricsMiddleware`; social collectors by the
//! services. `/metrics` renders everything in the default registry.

use actix_web::{web, HttpResponse};
use prometheus::{Encoder, TextEncoder};
use sqlx::PgPool;

pub mod http;
pub mod social;

/// Name used as the `service` label on shared collectors.
pub const SERVICE_NAME: &str = "campus-crush-api";

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics(pool: web::Data<PgPool>) -> HttpResponse {
    db_pool::update_pool_metrics(pool.get_ref(), SERVICE_NAME);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
