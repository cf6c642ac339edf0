//! Schema migration management on top of the embedded migrator.

use crate::db::{EXPECTED_TABLES, MIGRATOR};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrate;
use sqlx::PgPool;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Target of `manage-db migrate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    /// Every embedded migration
    Head,
    /// No migration at all
    Base,
    /// One step back from the latest applied migration (`-1`)
    Previous,
    /// A specific version; it stays applied on downgrade
    Version(i64),
}

impl FromStr for Revision {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "head" | "heads" => Ok(Revision::Head),
            "base" => Ok(Revision::Base),
            "-1" => Ok(Revision::Previous),
            other => other
                .parse::<i64>()
                .map(Revision::Version)
                .with_context(|| format!("invalid revision '{}'", other)),
        }
    }
}

/// Public tables currently in the database, excluding the migration ledger.
pub async fn list_tables(pool: &PgPool) -> Result<Vec<String>> {
    let tables = sqlx::query_scalar::<_, String>(
        r#"
        SELECT table_name::text FROM information_schema.tables
        WHERE table_schema = 'public'
          AND table_type = 'BASE TABLE'
          AND table_name <> '_sqlx_migrations'
        ORDER BY table_name
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to list tables")?;
    Ok(tables)
}

/// Apply pending migrations and return the tables they created.
pub async fn run_startup_migrations(pool: &PgPool) -> Result<Vec<String>> {
    let before: HashSet<String> = list_tables(pool).await?.into_iter().collect();
    db_pool::migrate(pool, &MIGRATOR)
        .await
        .context("failed to apply migrations")?;
    let after = list_tables(pool).await?;
    Ok(after.into_iter().filter(|t| !before.contains(t)).collect())
}

fn embedded_versions() -> Vec<i64> {
    MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .collect()
}

/// Apply migrations up to `revision`; returns the versions applied.
pub async fn upgrade(pool: &PgPool, revision: Revision) -> Result<Vec<i64>> {
    let target = match revision {
        Revision::Head => {
            return db_pool::migrate(pool, &MIGRATOR)
                .await
                .context("failed to apply migrations");
        }
        Revision::Version(version) => version,
        Revision::Base | Revision::Previous => {
            bail!("'{:?}' is only valid together with --downgrade", revision)
        }
    };

    if !embedded_versions().contains(&target) {
        bail!("unknown migration version {}", target);
    }

    let mut conn = db_pool::acquire_with_metrics(pool, "manage-db").await?;
    conn.ensure_migrations_table().await?;
    let applied: HashSet<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|m| m.version)
        .collect();

    let mut newly_applied = Vec::new();
    for migration in MIGRATOR.iter().filter(|m| {
        !m.migration_type.is_down_migration() && m.version <= target && !applied.contains(&m.version)
    }) {
        conn.apply(migration)
            .await
            .with_context(|| format!("failed to apply migration {}", migration.version))?;
        info!(version = migration.version, description = %migration.description, "Applied migration");
        newly_applied.push(migration.version);
    }
    Ok(newly_applied)
}

/// Version everything above which gets reverted.
pub fn downgrade_target(revision: Revision, applied: &[i64]) -> Result<i64> {
    match revision {
        Revision::Base => Ok(0),
        Revision::Version(version) => Ok(version),
        Revision::Previous => {
            let mut sorted = applied.to_vec();
            sorted.sort_unstable();
            match sorted.len() {
                0 => bail!("no migrations are applied"),
                1 => Ok(0),
                n => Ok(sorted[n - 2]),
            }
        }
        Revision::Head => bail!("cannot downgrade to head"),
    }
}

/// Revert migrations down to `revision`; returns the versions reverted.
pub async fn downgrade(pool: &PgPool, revision: Revision) -> Result<Vec<i64>> {
    let applied = db_pool::applied_versions(pool).await?;
    let target = downgrade_target(revision, &applied)?;

    MIGRATOR
        .undo(pool, target)
        .await
        .with_context(|| format!("failed to revert migrations above {}", target))?;

    let reverted: Vec<i64> = applied.into_iter().filter(|v| *v > target).collect();
    info!(target, reverted = reverted.len(), "Downgrade completed");
    Ok(reverted)
}

/// Differences between the database and the embedded migrations
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub applied: Vec<i64>,
    pub pending: Vec<i64>,
    pub unknown: Vec<i64>,
    pub missing_tables: Vec<String>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.pending.is_empty() && self.unknown.is_empty() && self.missing_tables.is_empty()
    }
}

pub fn compare(applied: Vec<i64>, embedded: &[i64], tables: &[String]) -> VerifyReport {
    let pending = embedded
        .iter()
        .copied()
        .filter(|v| !applied.contains(v))
        .collect();
    let unknown = applied
        .iter()
        .copied()
        .filter(|v| !embedded.contains(v))
        .collect();
    let missing_tables = EXPECTED_TABLES
        .iter()
        .filter(|t| !tables.iter().any(|have| have == *t))
        .map(|t| t.to_string())
        .collect();

    VerifyReport {
        applied,
        pending,
        unknown,
        missing_tables,
    }
}

/// Check applied migrations and expected tables.
pub async fn verify(pool: &PgPool) -> Result<VerifyReport> {
    let applied = db_pool::applied_versions(pool)
        .await
        .context("failed to read applied migrations")?;
    let tables = list_tables(pool).await?;
    Ok(compare(applied, &embedded_versions(), &tables))
}

/// `Add friend requests!` -> `add_friend_requests`
pub fn slugify(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    for c in message.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Write empty up/down migration files named after `message`.
pub fn create_migration_files(
    dir: &Path,
    message: &str,
    now: DateTime<Utc>,
) -> Result<(PathBuf, PathBuf)> {
    let slug = slugify(message);
    if slug.is_empty() {
        bail!("migration message must contain letters or digits");
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let stem = format!("{}_{}", now.format("%Y%m%d%H%M%S"), slug);
    let up = dir.join(format!("{}.up.sql", stem));
    let down = dir.join(format!("{}.down.sql", stem));

    std::fs::write(&up, format!("-- {}\n-- Add the schema change here.\n", message.trim()))
        .with_context(|| format!("failed to write {}", up.display()))?;
    std::fs::write(&down, format!("-- Revert: {}\n", message.trim()))
        .with_context(|| format!("failed to write {}", down.display()))?;

    Ok((up, down))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_revision_parsing() {
        assert_eq!("head".parse::<Revision>().unwrap(), Revision::Head);
        assert_eq!("base".parse::<Revision>().unwrap(), Revision::Base);
        assert_eq!("-1".parse::<Revision>().unwrap(), Revision::Previous);
        assert_eq!(
            "20240301000000".parse::<Revision>().unwrap(),
            Revision::Version(20240301000000)
        );
        assert!("abc".parse::<Revision>().is_err());
    }

    #[test]
    fn test_downgrade_target() {
        let applied = [20240301000000, 20240101000000];
        assert_eq!(downgrade_target(Revision::Previous, &applied).unwrap(), 20240101000000);
        assert_eq!(downgrade_target(Revision::Previous, &applied[..1]).unwrap(), 0);
        assert_eq!(downgrade_target(Revision::Base, &applied).unwrap(), 0);
        assert!(downgrade_target(Revision::Previous, &[]).is_err());
        assert!(downgrade_target(Revision::Head, &applied).is_err());
    }

    #[test]
    fn test_compare_reports_drift() {
        let tables: Vec<String> = EXPECTED_TABLES
            .iter()
            .filter(|t| **t != "notifications")
            .map(|t| t.to_string())
            .collect();
        let report = compare(vec![1, 3], &[1, 2], &tables);
        assert_eq!(report.pending, vec![2]);
        assert_eq!(report.unknown, vec![3]);
        assert_eq!(report.missing_tables, vec!["notifications".to_string()]);
        assert!(!report.is_ok());

        let all: Vec<String> = EXPECTED_TABLES.iter().map(|t| t.to_string()).collect();
        assert!(compare(vec![1, 2], &[1, 2], &all).is_ok());
    }

    #[test]
    fn test_embedded_migrations_are_known() {
        let versions = embedded_versions();
        assert!(versions.contains(&20240101000000));
        assert!(versions.contains(&20240301000000));
    }

    #[test]
    fn test_create_migration_files() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let (up, down) = create_migration_files(dir.path(), "Add post tags!", now).unwrap();
        assert_eq!(
            up.file_name().unwrap().to_str().unwrap(),
            "20240506070809_add_post_tags.up.sql"
        );
        assert!(down.exists());
        assert!(std::fs::read_to_string(&up).unwrap().contains("Add post tags!"));

        assert!(create_migration_files(dir.path(), "!!!", now).is_err());
    }
}
