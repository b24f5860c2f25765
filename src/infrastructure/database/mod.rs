//! SQLite persistence through SeaORM: entities, migrations, repositories.

pub mod entities;
pub mod migrator;
pub mod repositories;

#[cfg(test)]
pub mod testing;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// e.g. `sqlite://./user-directory.db?mode=rwc` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::sqlite("./user-directory.db")
    }
}

impl DatabaseConfig {
    /// File-backed SQLite, created on first connect.
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            max_connections: 10,
        }
    }

    /// Each connection to `:memory:` opens its own empty database.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    fn pool_size(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections.max(1)
        }
    }
}

/// Opens the connection pool. Migrations are run separately by the caller.
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let pool_size = config.pool_size();
    if config.is_in_memory() && config.max_connections > 1 {
        warn!(
            requested = config.max_connections,
            "In-memory database: pool pinned to one connection"
        );
    }
    info!(url = %config.url, pool_size, "Connecting to database");

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(pool_size)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    if config.is_in_memory() {
        // Dropping the last connection would drop the data with it.
        options.min_connections(1);
    }

    let db = Database::connect(options).await?;
    info!("Database connected");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_are_pinned_to_one_connection() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".into(),
            max_connections: 8,
        };
        assert!(config.is_in_memory());
        assert_eq!(config.pool_size(), 1);

        let file = DatabaseConfig::sqlite("./users.db");
        assert!(!file.is_in_memory());
        assert_eq!(file.pool_size(), 10);
        assert_eq!(file.url, "sqlite://./users.db?mode=rwc");
    }
}
