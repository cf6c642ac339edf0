//! Smoke test for the R2 credentials in the environment.

use anyhow::{Context, Result};
use campus_crush_api::ops::r2::{describe_config, test_connection};
use campus_crush_api::telemetry::init_tracing;
use s3_utils::{R2Client, R2Config};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing(false);

    let config = R2Config::from_env();
    println!("R2 configuration:");
    for (name, value) in describe_config(&config) {
        println!("  {:<22} {}", name, value);
    }

    let client = R2Client::with_config(config)
        .await
        .context("R2 is not configured")?;
    let report = test_connection(&client).await?;

    if report.bucket_created {
        println!("Bucket {} was missing and has been created", client.config().bucket);
    }
    for key in &report.test_keys {
        println!("Wrote {}", key);
    }
    println!("Bucket holds {} object(s)", report.object_count);
    for key in &report.sample_keys {
        println!("  {}", key);
    }
    println!("R2 connection OK");
    Ok(())
}
