//! Switch every account to Google sign-in.

use anyhow::{Context, Result};
use campus_crush_api::ops::auth_provider::migrate_to_google;
use campus_crush_api::telemetry::init_tracing;
use db_pool::{create_pool, DbConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing(false);

    let pool = create_pool(DbConfig::for_cli("migrate-auth-provider"))
        .await
        .context("failed to connect to the database")?;
    let updated = migrate_to_google(&pool).await?;
    println!("Updated {} user(s) to the google auth provider", updated);
    Ok(())
}
