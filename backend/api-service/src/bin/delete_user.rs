//! Permanently delete a user and their content.

use anyhow::{Context, Result};
use campus_crush_api::ops::purge::delete_user_by_email;
use campus_crush_api::telemetry::init_tracing;
use clap::Parser;
use db_pool::{create_pool, DbConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "delete-user")]
#[clap(about = "Delete a user with every post, comment, reaction, notification and friendship")]
struct Args {
    #[clap(long)]
    email: String,

    /// Directory holding locally stored uploads
    #[clap(long, env = "UPLOAD_DIRECTORY", default_value = "uploads")]
    upload_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing(false);
    let args = Args::parse();

    let pool = create_pool(DbConfig::for_cli("delete-user"))
        .await
        .context("failed to connect to the database")?;
    let report = delete_user_by_email(&pool, &args.upload_dir, &args.email).await?;

    match report.user_id {
        None => println!("No user found with email {}", args.email),
        Some(id) => {
            println!("Deleted user {}", id);
            for (table, rows) in &report.deleted {
                println!("  {:<20} {}", table, rows);
            }
            if report.removed_picture {
                println!("Removed local profile picture");
            }
        }
    }
    Ok(())
}
