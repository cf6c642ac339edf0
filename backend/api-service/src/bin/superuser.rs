//! Create or promote an administrator account.

use anyhow::{Context, Result};
use campus_crush_api::ops::superuser::{create_superuser, AUTO_PASSWORD};
use campus_crush_api::telemetry::init_tracing;
use clap::Parser;
use db_pool::{create_pool, DbConfig};

#[derive(Parser, Debug)]
#[clap(name = "superuser")]
#[clap(about = "Create an administrator, or promote the account using the email")]
struct Args {
    #[clap(long)]
    email: String,

    /// Plain password, or `auto` to generate one
    #[clap(long, default_value = AUTO_PASSWORD)]
    password: String,

    #[clap(long, default_value = "Administrator")]
    full_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing(false);
    let args = Args::parse();

    let pool = create_pool(DbConfig::for_cli("superuser"))
        .await
        .context("failed to connect to the database")?;
    let outcome = create_superuser(&pool, &args.email, &args.password, &args.full_name).await?;

    if outcome.created {
        println!("Created administrator {} ({})", outcome.user.username, outcome.user.email);
    } else {
        println!("Promoted {} ({}) to administrator", outcome.user.username, outcome.user.email);
    }
    if let Some(password) = outcome.generated_password {
        println!("Generated password: {}", password);
    }
    Ok(())
}
