//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time. The server never runs them on startup.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use super::{CliError, connect};

/// Apply all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let store = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(store.pool()).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
