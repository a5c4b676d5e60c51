//! Database connection pool management
//!
//! Uses sqlx `AnyPool` so the engine is picked at runtime from the URL scheme:
//! an embedded SQLite file or a networked MySQL server.

use std::path::Path;

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use tracing::info;

use crate::config::StorageConfig;
use crate::error::Result;

/// File name of the embedded database inside the data directory
pub const DATABASE_FILE: &str = "database.sqlite";

/// Which engine a pool talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    /// Keyword for an auto-assigned integer primary key
    pub fn auto_increment(self) -> &'static str {
        match self {
            Dialect::Sqlite => "AUTOINCREMENT",
            Dialect::MySql => "AUTO_INCREMENT",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
        }
    }
}

/// Create the connection pool described by `config`.
///
/// For SQLite the data directory is created and the file is created if missing.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the first connection fails.
/// Callers treat this as fatal.
pub async fn create_pool(config: &StorageConfig, data_dir: &Path) -> Result<AnyPool> {
    install_default_drivers();

    if config.dialect() == Dialect::Sqlite {
        tokio::fs::create_dir_all(data_dir).await?;
    }

    let pool = AnyPoolOptions::new()
        .max_connections(config.pool.max_connections)
        .max_lifetime(config.pool.max_lifetime())
        .acquire_timeout(config.pool.acquire_timeout())
        .connect(&config.connection_url(data_dir))
        .await?;

    info!(
        pool = %config.pool.name,
        dialect = config.dialect().name(),
        url = %config.redacted_url(data_dir),
        max_connections = config.pool.max_connections,
        "connection pool opened"
    );

    Ok(pool)
}
