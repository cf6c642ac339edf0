//! `pg_dump` backups of the configured database.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Url;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

pub const DEFAULT_BACKUP_DIR: &str = "database_backups";

/// Connection parameters for `pg_dump`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

impl DumpTarget {
    /// Parse a `postgres://` / `postgresql://` DSN.
    pub fn from_database_url(database_url: &str) -> Result<Self> {
        let url = Url::parse(database_url).context("DATABASE_URL is not a valid URL")?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            bail!("DATABASE_URL must use the postgres:// scheme");
        }

        let database = url.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            bail!("DATABASE_URL does not name a database");
        }

        let decode = |s: &str| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        Ok(Self {
            host: url.host_str().unwrap_or("localhost").to_string(),
            port: url.port().unwrap_or(5432),
            user: match url.username() {
                "" => "postgres".to_string(),
                name => decode(name),
            },
            password: url.password().map(decode),
            database,
        })
    }

    pub fn backup_file(&self, dir: &Path, now: DateTime<Utc>) -> PathBuf {
        dir.join(format!("{}_{}.sql", self.database, now.format("%Y%m%d_%H%M%S")))
    }
}

/// Dump the database into `dir` and return the backup path.
pub async fn backup_database(database_url: &str, dir: &Path) -> Result<PathBuf> {
    let target = DumpTarget::from_database_url(database_url)?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let file = target.backup_file(dir, Utc::now());
    info!(database = %target.database, file = %file.display(), "Creating database backup");

    let mut command = Command::new("pg_dump");
    command
        .arg("-h")
        .arg(&target.host)
        .arg("-p")
        .arg(target.port.to_string())
        .arg("-U")
        .arg(&target.user)
        .arg("-d")
        .arg(&target.database)
        .arg("-f")
        .arg(&file);
    if let Some(password) = &target.password {
        command.env("PGPASSWORD", password);
    }

    let output = command
        .output()
        .await
        .context("failed to run pg_dump; is the PostgreSQL client installed?")?;
    if !output.status.success() {
        bail!(
            "pg_dump failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(file)
}
