//! Dump the database with pg_dump.

use anyhow::Result;
use campus_crush_api::ops::backup::{backup_database, DEFAULT_BACKUP_DIR};
use campus_crush_api::telemetry::init_tracing;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "backup-db")]
#[clap(about = "Write a pg_dump of DATABASE_URL into the backup directory")]
struct Args {
    /// Connection string to dump
    #[clap(long, env = "DATABASE_URL", default_value = db_pool::DEFAULT_DATABASE_URL, hide_env_values = true)]
    database_url: String,

    /// Output directory
    #[clap(long, default_value = DEFAULT_BACKUP_DIR)]
    dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing(false);
    let args = Args::parse();

    let path = backup_database(&args.database_url, &args.dir).await?;
    println!("Backup created: {}", path.display());
    Ok(())
}
