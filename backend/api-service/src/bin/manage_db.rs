//! Schema migration management.

use anyhow::{bail, Context, Result};
use campus_crush_api::ops::backup::{backup_database, DEFAULT_BACKUP_DIR};
use campus_crush_api::ops::migrations::{
    create_migration_files, downgrade, upgrade, verify, Revision,
};
use campus_crush_api::telemetry::init_tracing;
use clap::{Parser, Subcommand};
use db_pool::{create_pool, DbConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "manage-db")]
#[clap(about = "Apply, revert, verify and create database migrations")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upgrade (default) or downgrade the schema
    Migrate {
        /// Revert instead of applying
        #[clap(long)]
        downgrade: bool,

        /// Only check applied migrations and tables
        #[clap(long)]
        verify: bool,

        /// Skip the pg_dump backup taken before changing the schema
        #[clap(long)]
        no_backup: bool,

        /// `head`, `base`, `-1` or a migration version
        #[clap(allow_hyphen_values = true)]
        revision: Option<String>,
    },
    /// Write empty up/down migration files
    Create {
        message: String,

        /// Migrations directory
        #[clap(long, default_value = "backend/api-service/migrations")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing(false);
    let args = Args::parse();

    match args.command {
        Command::Create { message, dir } => {
            let (up, down) = create_migration_files(&dir, &message, chrono::Utc::now())?;
            println!("Created {}", up.display());
            println!("Created {}", down.display());
            Ok(())
        }
        Command::Migrate {
            downgrade: revert,
            verify: verify_only,
            no_backup,
            revision,
        } => {
            let db_cfg = DbConfig::for_cli("manage-db");
            let pool = create_pool(db_cfg.clone())
                .await
                .context("failed to connect to the database")?;

            if verify_only {
                let report = verify(&pool).await?;
                println!("Applied migrations: {:?}", report.applied);
                if !report.pending.is_empty() {
                    println!("Pending migrations: {:?}", report.pending);
                }
                if !report.unknown.is_empty() {
                    println!("Applied but unknown migrations: {:?}", report.unknown);
                }
                if !report.missing_tables.is_empty() {
                    println!("Missing tables: {}", report.missing_tables.join(", "));
                }
                if !report.is_ok() {
                    bail!("database does not match the embedded migrations");
                }
                println!("Database schema verified");
                return Ok(());
            }

            if !no_backup {
                let path = backup_database(&db_cfg.database_url, &PathBuf::from(DEFAULT_BACKUP_DIR))
                    .await
                    .context("backup failed; rerun with --no-backup to skip it")?;
                println!("Backup written to {}", path.display());
            }

            if revert {
                let revision = match revision.as_deref() {
                    Some(raw) => raw.parse::<Revision>()?,
                    None => Revision::Previous,
                };
                let reverted = downgrade(&pool, revision).await?;
                println!("Reverted {} migration(s): {:?}", reverted.len(), reverted);
            } else {
                let revision = match revision.as_deref() {
                    Some(raw) => raw.parse::<Revision>()?,
                    None => Revision::Head,
                };
                let applied = upgrade(&pool, revision).await?;
                println!("Applied {} migration(s): {:?}", applied.len(), applied);
            }
            Ok(())
        }
    }
}
