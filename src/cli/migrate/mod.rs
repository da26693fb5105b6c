//! Migrate command - manages the PostgreSQL schema

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{connect_pool, Migrator, PostgresConfig, PostgresMigrator};

/// Arguments for the migrate command
#[derive(Args, Clone, Debug)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration
    #[arg(long, conflicts_with = "status")]
    pub revert: bool,

    /// Print the current schema version and exit
    #[arg(long)]
    pub status: bool,
}

/// Apply pending migrations, or revert/inspect per the flags
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let url = config
        .storage
        .database_url
        .clone()
        .context("storage.database_url is required to run migrations")?;
    let pool = connect_pool(&PostgresConfig::new(url)).await?;
    let migrator = PostgresMigrator::new(pool);

    if args.status {
        match migrator.version().await? {
            Some(version) => info!(version, "Schema is at version {}", version),
            None => info!("No migrations applied"),
        }
    } else if args.revert {
        migrator.revert().await?;
        info!(version = ?migrator.version().await?, "Reverted latest migration");
    } else {
        migrator.run().await?;
        info!(version = ?migrator.version().await?, "Migrations applied");
    }

    Ok(())
}
