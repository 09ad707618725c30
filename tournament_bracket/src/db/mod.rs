//! Database module providing PostgreSQL connection pooling and storage.
//!
//! This module manages the connection pool and schema migrations, and holds
//! the repository traits with their PostgreSQL and in-memory implementations.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::bracket::BracketResult;

pub mod config;
pub mod memory;
pub mod repository;

pub use config::DatabaseConfig;
pub use memory::InMemoryStore;
pub use repository::{MatchRepository, PgStore, PlayerRepository, TournamentRepository};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tournament_bracket::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::from_env();
    ///     let db = Database::new(&config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> BracketResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        log::info!("Database migrations applied");
        Ok(())
    }

    /// Store backed by this pool
    pub fn store(&self) -> PgStore {
        PgStore::new(self.pool.clone())
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
