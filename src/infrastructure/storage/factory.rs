//! Store selection at startup

use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::team::Team;
use crate::domain::{AccountDirectory, DomainError};
use crate::infrastructure::invite::{InMemoryInviteRepository, PostgresInviteRepository};
use crate::infrastructure::team::{InMemoryTeamRepository, PostgresTeamRepository};
use crate::infrastructure::user::{InMemoryUserRepository, PostgresUserRepository};

use super::postgres::{connect_pool, PostgresConfig};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage, optionally seeded with teams
    InMemory { teams: Vec<Team> },
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory { teams: Vec::new() }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory { .. } => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// The account store: a directory over the selected backend
#[derive(Debug, Clone)]
pub struct Store {
    directory: AccountDirectory,
    pool: Option<PgPool>,
}

impl Store {
    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Check that the backend can serve requests
    pub async fn ping(&self) -> Result<(), DomainError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| DomainError::storage(format!("Database ping failed: {}", e)))?;

        Ok(())
    }
}

/// Factory for creating the account store
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a store based on the configuration
    pub async fn create(config: &StorageConfig) -> Result<Store, DomainError> {
        match config {
            StorageConfig::InMemory { teams } => Ok(Self::create_in_memory(teams.clone())),
            StorageConfig::Postgres(pg_config) => {
                let pool = connect_pool(pg_config).await?;
                Ok(Self::create_postgres(pool))
            }
        }
    }

    /// Creates an in-memory store
    pub fn create_in_memory(teams: Vec<Team>) -> Store {
        Store {
            directory: AccountDirectory::new(
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryTeamRepository::with_teams(teams)),
                Arc::new(InMemoryInviteRepository::new()),
            ),
            pool: None,
        }
    }

    /// Creates a PostgreSQL store over an existing pool
    pub fn create_postgres(pool: PgPool) -> Store {
        Store {
            directory: AccountDirectory::new(
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresTeamRepository::new(pool.clone())),
                Arc::new(PostgresInviteRepository::new(pool.clone())),
            ),
            pool: Some(pool),
        }
    }
}
