//! Upload locally stored media to R2.

use anyhow::{bail, Context, Result};
use campus_crush_api::config::Config;
use campus_crush_api::ops::r2::{rewrite_media_urls, upload_local_media};
use campus_crush_api::telemetry::init_tracing;
use clap::Parser;
use db_pool::{create_pool, DbConfig};
use s3_utils::R2Client;

#[derive(Parser, Debug)]
#[clap(name = "migrate-to-r2")]
#[clap(about = "Copy uploads/post_media and uploads/profile_pictures into the R2 bucket")]
struct Args {
    /// Also point stored media URLs at R2
    #[clap(long)]
    update_urls: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing(false);
    let args = Args::parse();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;
    let client = R2Client::with_config(config.storage.r2.clone())
        .await
        .context("R2 is not configured")?;

    let mut report = upload_local_media(&client, &config.storage.upload_directory).await?;
    println!("Uploaded: {}", report.uploaded);
    println!("Failed:   {}", report.failed);

    if args.update_urls {
        let pool = create_pool(DbConfig::for_cli("migrate-to-r2").with_url(config.database.url.clone()))
            .await
            .context("failed to connect to the database")?;
        rewrite_media_urls(&pool, client.config(), &config.app.base_url, &mut report).await?;
        println!("Post media URLs updated: {}", report.posts_updated);
        println!("Profile picture URLs updated: {}", report.users_updated);
    }

    if report.failed > 0 {
        bail!("{} file(s) failed to upload", report.failed);
    }
    Ok(())
}
