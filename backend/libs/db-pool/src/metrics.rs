//! Pool gauges and acquisition metrics, labelled by the owning binary.

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

lazy_static::lazy_static! {
    static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Connections in the pool by state (idle, active, max)",
        &["service", "state"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref DB_POOL_ACQUIRE_DURATION: HistogramVec = register_histogram_vec!(
        "db_pool_acquire_duration_seconds",
        "Time spent waiting for a pooled connection",
        &["service"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref DB_POOL_ACQUIRE_ERRORS: IntCounterVec = register_int_counter_vec!(
        "db_pool_connection_errors_total",
        "Failed connection acquisitions by cause",
        &["service", "error_type"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// Label for a failed `acquire`.
fn acquire_error_kind(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::PoolTimedOut => "timeout",
        sqlx::Error::PoolClosed => "closed",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "network",
        _ => "other",
    }
}

/// Snapshot pool occupancy into the gauges. Called on every `/metrics` scrape.
pub fn update_pool_metrics(pool: &PgPool, service: &str) {
    let size = i64::from(pool.size());
    let idle = pool.num_idle() as i64;
    let max = i64::from(pool.options().get_max_connections());

    for (state, value) in [("idle", idle), ("active", size - idle), ("max", max)] {
        DB_POOL_CONNECTIONS
            .with_label_values(&[service, state])
            .set(value);
    }
}

/// `pool.acquire()` with latency and failure accounting.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let start = Instant::now();
    let result = pool.acquire().await;

    DB_POOL_ACQUIRE_DURATION
        .with_label_values(&[service])
        .observe(start.elapsed().as_secs_f64());

    if let Err(e) = &result {
        DB_POOL_ACQUIRE_ERRORS
            .with_label_values(&[service, acquire_error_kind(e)])
            .inc();
    }

    result
}
