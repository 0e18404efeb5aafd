//! # Persistence Errors
//!
//! [`DbError`] covers both SQLite failures and rule rejections raised while a
//! unit of work is open.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Rule violation (CoreError)         │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  DbError::{QueryFailed, ...}         DbError::Domain(CoreError)         │
//! │       │                                    │                            │
//! │       └──────────────┬─────────────────────┘                            │
//! │                      ▼                                                  │
//! │  Transaction dropped without commit → ROLLBACK                         │
//! │                      ▼                                                  │
//! │  Caller branches on DbError::domain()                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use emporium_core::CoreError;
use thiserror::Error;

/// Everything the persistence layer can report.
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule rejected the operation. Nothing was written.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A collaborator-level lookup or update found no row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `UNIQUE` constraint, e.g. a second payment row for one order.
    /// `field` is SQLite's `table.column`.
    #[error("{field} already exists")]
    UniqueViolation { field: String },

    /// `FOREIGN KEY` constraint.
    ///
    /// ## When This Occurs
    /// - Deleting a product still referenced by order lines
    /// - Inserting a row that points at a missing customer or product
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement failure (CHECK constraints included).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN or COMMIT failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Another writer held the database lock past the busy timeout.
    /// Nothing was written; the operation can be retried.
    #[error("Database is locked by another writer")]
    Busy,

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the business rule violation, if that is what this is.
    ///
    /// ## Example
    /// ```rust,ignore
    /// match db.fulfillment().place_order(&customer, &lines).await {
    ///     Err(e) if matches!(e.domain(), Some(CoreError::InsufficientStock { .. })) => ...,
    ///     ...
    /// }
    /// ```
    pub fn domain(&self) -> Option<&CoreError> {
        match self {
            DbError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";
const FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";
const LOCKED_MESSAGES: [&str; 2] = ["database is locked", "database table is locked"];

/// Sorts a SQLite error message into a constraint kind.
///
/// ```text
/// "UNIQUE constraint failed: payments.order_id"  ──► UniqueViolation { field: "payments.order_id" }
/// "FOREIGN KEY constraint failed"                ──► ForeignKeyViolation
/// "database is locked"                           ──► Busy
/// anything else                                  ──► QueryFailed
/// ```
fn classify_database_message(msg: &str) -> DbError {
    if let Some(idx) = msg.find(UNIQUE_PREFIX) {
        DbError::UniqueViolation {
            field: msg[idx + UNIQUE_PREFIX.len()..].trim().to_string(),
        }
    } else if msg.contains(FOREIGN_KEY_MESSAGE) {
        DbError::ForeignKeyViolation {
            message: msg.to_string(),
        }
    } else if LOCKED_MESSAGES.iter().any(|m| msg.contains(m)) {
        DbError::Busy
    } else {
        DbError::QueryFailed(msg.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => classify_database_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
