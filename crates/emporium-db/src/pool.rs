//! # Database Handle
//!
//! Opens the SQLite store behind Emporium and hands out repositories, the
//! fulfillment engine and units of work.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Opening the Store                               │
//! │                                                                         │
//! │  DbConfig::new("emporium.db")       DbConfig::in_memory()              │
//! │            │                                 │                          │
//! │            └───────────────┬─────────────────┘                          │
//! │                            ▼                                            │
//! │  Database::new(config)   pool + PRAGMA foreign_keys + migrations       │
//! │            │                                                            │
//! │            ├── products() / customers() / orders()   plain reads       │
//! │            │                                                            │
//! │            └── fulfillment()   place / pay / cancel / delete account   │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │                 begin() ──► UnitOfWork   (one SQLite transaction)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File databases use WAL journaling so the CLI's reads never wait on the
//! single writer.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::fulfillment::Fulfillment;
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::unit_of_work::UnitOfWork;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the store lives and how the pool behaves.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/emporium/emporium.db")
///     .max_connections(4)
///     .idle_timeout(None);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Pool ceiling. Default: 5
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1
    pub min_connections: u32,

    /// How long to wait for a free connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// How long a connection waits for another writer's lock before giving
    /// up with "database is locked". Default: 5 seconds
    pub busy_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps it forever.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Maximum lifetime of a connection. `None` keeps it forever.
    /// Default: 30 minutes
    pub max_lifetime: Option<Duration>,

    /// Apply pending migrations when opening. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for a database file at `path`, created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Skip migrations when the schema is managed elsewhere.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private, empty database that disappears with the pool. Used by tests.
    ///
    /// Every SQLite connection to `:memory:` opens its own empty database,
    /// so the pool is pinned to one connection that is never recycled.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: None,
            max_lifetime: None,
            run_migrations: true,
        }
    }

    /// Whether this configuration targets an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                // WAL: readers and the single writer don't block each other
                .journal_mode(SqliteJournalMode::Wal)
                // NORMAL: safe from corruption, may lose the last commit on power loss
                .synchronous(SqliteSynchronous::Normal)
        };

        // SQLite has foreign keys disabled by default
        Ok(options.foreign_keys(true).busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository and engine access.
///
/// Cloning is cheap: every clone shares the same pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./emporium.db")).await?;
///
/// let pen = db.products().insert(&Product::new("Pen", "Stationery", price, 10)?).await?;
/// let order = db.fulfillment().place_order(&customer.id, &lines).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Opens the store.
    ///
    /// ## Steps
    /// 1. Build connect options (file or `:memory:`, foreign keys on)
    /// 2. Open the pool
    /// 3. Apply migrations unless disabled
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let connect_options = config.connect_options()?;
        debug!(in_memory = config.is_in_memory(), "Connection options configured");

        let pool = SqlitePoolOptions::new()
            // one writer at a time; extra connections only serve reads
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies any migrations not yet recorded. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        debug!("Applying migrations");
        migrations::run_migrations(&self.pool).await?;
        Ok(())
    }

    /// Raw pool access, mostly for tests and ad-hoc queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Catalog administration.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Order reads. Writes go through [`Database::fulfillment`].
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn fulfillment(&self) -> Fulfillment {
        Fulfillment::new(self.clone())
    }

    /// Starts a unit of work (one SQLite transaction).
    ///
    /// ## Note
    /// With a single-connection pool (in-memory databases) the open unit of
    /// work holds the only connection. Do not use the repositories until it
    /// is committed or dropped.
    pub async fn begin(&self) -> DbResult<UnitOfWork> {
        UnitOfWork::begin(&self.pool).await
    }

    /// Waits for open connections to finish, then shuts the pool.
    /// Later calls on any clone fail with a connection error.
    pub async fn close(&self) {
        debug!("Closing database");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("shop.db")
            .max_connections(3)
            .idle_timeout(None)
            .run_migrations(false);

        assert_eq!(config.max_connections, 3);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.idle_timeout, None);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
