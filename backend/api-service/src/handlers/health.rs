/// Health, readiness, liveness and root endpoints
use crate::config::Config;
use crate::services::MediaStorage;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;

const SERVICE_NAME: &str = "campus-crush-api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: ComponentStatus,
    pub checks: HashMap<String, ComponentCheck>,
    pub timestamp: String,
}

impl ReadinessResponse {
    /// Overall status: unhealthy wins over degraded.
    pub fn from_checks(checks: HashMap<String, ComponentCheck>) -> Self {
        let ready = checks
            .values()
            .all(|c| c.status != ComponentStatus::Unhealthy);
        let status = if !ready {
            ComponentStatus::Unhealthy
        } else if checks.values().any(|c| c.status == ComponentStatus::Degraded) {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        };

        Self {
            ready,
            status,
            checks,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

async fn check_postgres(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ())
}

pub async fn health_summary(pool: web::Data<PgPool>) -> HttpResponse {
    match check_postgres(&pool).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": SERVICE_NAME
        })),
    }
}

pub async fn readiness_summary(
    pool: web::Data<PgPool>,
    storage: web::Data<MediaStorage>,
) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let pg_result = check_postgres(&pool).await;
    let pg_latency = Some(start.elapsed().as_millis() as u64);
    let postgres_check = match pg_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "PostgreSQL connection successful".to_string(),
            latency_ms: pg_latency,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("PostgreSQL connection failed: {}", e),
            latency_ms: pg_latency,
        },
    };
    checks.insert("postgresql".to_string(), postgres_check);

    let r2_check = match storage.r2_client() {
        Some(r2) => {
            let start = Instant::now();
            let result = r2.health_check().await;
            let latency = Some(start.elapsed().as_millis() as u64);
            match result {
                Ok(()) => ComponentCheck {
                    status: ComponentStatus::Healthy,
                    message: "R2 bucket reachable".to_string(),
                    latency_ms: latency,
                },
                Err(e) => ComponentCheck {
                    status: ComponentStatus::Degraded,
                    message: format!("R2 health check failed: {}", e),
                    latency_ms: latency,
                },
            }
        }
        None => ComponentCheck {
            status: ComponentStatus::Degraded,
            message: "R2 not configured; using local storage".to_string(),
            latency_ms: None,
        },
    };
    checks.insert("r2".to_string(), r2_check);

    let response = ReadinessResponse::from_checks(checks);
    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

pub async fn root(config: web::Data<Config>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to Campus Crush",
        "version": config.app.version,
        "environment": config.app.environment,
        "documentation": null
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(status: ComponentStatus) -> ComponentCheck {
        ComponentCheck {
            status,
            message: String::new(),
            latency_ms: None,
        }
    }

    #[test]
    fn test_readiness_rollup() {
        let mut checks = HashMap::new();
        checks.insert("postgresql".to_string(), check(ComponentStatus::Healthy));
        checks.insert("r2".to_string(), check(ComponentStatus::Degraded));
        let response = ReadinessResponse::from_checks(checks);
        assert!(response.ready);
        assert_eq!(response.status, ComponentStatus::Degraded);

        let mut checks = HashMap::new();
        checks.insert("postgresql".to_string(), check(ComponentStatus::Unhealthy));
        checks.insert("r2".to_string(), check(ComponentStatus::Healthy));
        let response = ReadinessResponse::from_checks(checks);
        assert!(!response.ready);
        assert_eq!(response.status, ComponentStatus::Unhealthy);
    }
}
