//! ABOUTME: Table-scoped data access layer over SQLite
//! ABOUTME: Shared database handle, identifier validation, and generic repositories

pub mod config;
pub mod identifier;
pub mod query;
pub mod repository;
pub mod value;

pub use config::DatabaseConfig;
pub use query::{Order, SelectQuery};
pub use repository::TableRepository;
pub use value::SqlValue;

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, instrument};

use tb_core::{Error, Result};

/// Shared database handle
///
/// Owns the process-wide connection pool. Resolved once per process and
/// injected into every repository; no repository owns connection state of
/// its own.
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open the database described by `config`, creating the file if missing
    #[instrument(skip(config), fields(path = %config.path))]
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        info!("Opening database at: {}", config.path);

        let connect_options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(if config.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .pragma("foreign_keys", "ON")
            .pragma("synchronous", "NORMAL")
            .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .min_connections(1)
            .connect_with(connect_options)
            .await
            .map_err(|e| Error::Database(format!("Failed to create connection pool: {}", e)))?;

        info!("Database ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (for testing/reuse)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bind a typed repository to `table` on this handle
    pub fn repository<T>(&self, table: &str) -> Result<TableRepository<T>> {
        TableRepository::new(self.pool.clone(), table)
    }

    /// Begin a transaction owned by the caller
    ///
    /// The caller decides commit or rollback; repository operations join the
    /// transaction through their `_in` variants.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Check database health
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing database health check");

        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Health check failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::Id;

    /// Create a throwaway database with a unique file name
    async fn create_test_db() -> Db {
        let path = std::env::temp_dir().join(format!("test_tabula_{}.db", Id::new()));
        let config = DatabaseConfig::at_path(path.to_string_lossy().into_owned());
        Db::open(&config).await.expect("Failed to open test database")
    }

    #[tokio::test]
    async fn test_open_and_health_check() {
        let db = create_test_db().await;
        db.health_check().await.expect("Health check should pass");
    }

    #[tokio::test]
    async fn test_from_pool_shares_the_handle() {
        let db = create_test_db().await;
        let wrapped = Db::from_pool(db.pool().clone());
        wrapped
            .health_check()
            .await
            .expect("Health check should pass on the shared pool");
    }

    #[tokio::test]
    async fn test_repository_factory_validates_the_table_name() {
        let db = create_test_db().await;

        #[derive(Debug, sqlx::FromRow)]
        #[allow(dead_code)]
        struct AnyRow {
            id: String,
        }

        assert!(db.repository::<AnyRow>("users").is_ok());
        assert!(db.repository::<AnyRow>("users; DROP TABLE users").is_err());
    }

    #[tokio::test]
    async fn test_begin_hands_out_a_caller_owned_transaction() {
        let db = create_test_db().await;

        sqlx::query("CREATE TABLE marks (id TEXT PRIMARY KEY)")
            .execute(db.pool())
            .await
            .expect("Failed to create table");

        let mut tx = db.begin().await.expect("Failed to begin transaction");
        sqlx::query("INSERT INTO marks (id) VALUES ('m1')")
            .execute(&mut *tx)
            .await
            .expect("Failed to insert inside transaction");
        tx.rollback().await.expect("Failed to roll back");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM marks")
            .fetch_one(db.pool())
            .await
            .expect("Failed to count");
        assert_eq!(count.0, 0);
    }
}
