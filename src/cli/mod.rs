//! CLI module for Team Identity
//!
//! Provides subcommands:
//! - `serve`: run the HTTP API
//! - `migrate`: apply, revert or inspect PostgreSQL migrations

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Team Identity - accounts, sessions, invitations and billing for teams
#[derive(Parser)]
#[command(name = "team-identity")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Manage the PostgreSQL schema
    Migrate(migrate::MigrateArgs),
}

/// Load `.env`, configuration and logging shared by every command
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}
