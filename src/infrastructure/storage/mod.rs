//! Storage infrastructure - backend selection, pooling and migrations

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType, Store};
pub use migrations::{run_storage_migrations, Migration, Migrator, PostgresMigrator};
pub use postgres::{connect_pool, PostgresConfig};
