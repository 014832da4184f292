//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod stock;

use std::sync::Arc;

use bazaar_server::config::{ConfigError, ServerConfig};
use bazaar_server::db::{self, PostgresStore};
use bazaar_server::services::CommerceError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

/// Load configuration (including `.env`) and connect to `DATABASE_URL`.
async fn connect() -> Result<PostgresStore, CliError> {
    let config = ServerConfig::from_env()?;
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    Ok(PostgresStore::new(pool))
}

async fn connect_shared() -> Result<Arc<PostgresStore>, CliError> {
    connect().await.map(Arc::new)
}
