//! Pool tests against a live PostgreSQL.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test -p db-pool -- --ignored`

use db_pool::{acquire_with_metrics, applied_versions, create_pool, DbConfig};

fn test_config() -> DbConfig {
    DbConfig {
        service_name: "pool-test".to_string(),
        max_connections: 3,
        min_connections: 1,
        acquire_timeout_secs: 2,
        ..DbConfig::from_env("pool-test")
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_create_pool_and_acquire() {
    let pool = create_pool(test_config())
        .await
        .expect("Failed to create test pool");

    let mut conn = acquire_with_metrics(&pool, "pool-test")
        .await
        .expect("Should acquire connection");

    let one: i32 = sqlx::query_scalar("SELECT 1")
        .fetch_one(&mut *conn)
        .await
        .expect("query should succeed");
    assert_eq!(one, 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_acquire_times_out_when_exhausted() {
    let pool = create_pool(test_config())
        .await
        .expect("Failed to create test pool");

    let mut held = Vec::new();
    for _ in 0..3 {
        held.push(acquire_with_metrics(&pool, "pool-test").await.unwrap());
    }

    let result = acquire_with_metrics(&pool, "pool-test").await;
    assert!(matches!(result, Err(sqlx::Error::PoolTimedOut)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_applied_versions_is_readable() {
    let pool = create_pool(test_config())
        .await
        .expect("Failed to create test pool");

    let versions = applied_versions(&pool).await.expect("query should succeed");
    assert!(versions.windows(2).all(|w| w[0] < w[1]));
}
