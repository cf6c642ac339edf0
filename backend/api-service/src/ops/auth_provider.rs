//! One-off move of every account to Google sign-in.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

/// Make `hashed_password` nullable and mark every user as a Google account.
///
/// Returns the number of users updated. Safe to run more than once.
pub async fn migrate_to_google(pool: &PgPool) -> Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("ALTER TABLE users ALTER COLUMN hashed_password DROP NOT NULL")
        .execute(&mut *tx)
        .await
        .context("failed to make hashed_password nullable")?;

    let updated = sqlx::query("UPDATE users SET auth_provider = 'google' WHERE auth_provider <> 'google'")
        .execute(&mut *tx)
        .await
        .context("failed to update auth_provider")?
        .rows_affected();

    tx.commit().await?;
    info!(updated, "Auth provider migration complete");
    Ok(updated)
}
