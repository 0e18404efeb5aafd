//! # emporium-db: Database Layer and Fulfillment Engine for Emporium
//!
//! SQLite storage through sqlx, plus the engine that runs every order
//! operation inside one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Data Flow                               │
//! │                                                                         │
//! │  CLI command (order place ...)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   emporium-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐     │   │
//! │  │   │ Fulfillment │──►│ UnitOfWork  │──►│  Repositories    │     │   │
//! │  │   │ place / pay │   │ (one tx)    │   │  product.rs      │     │   │
//! │  │   │ cancel /    │   │             │   │  customer.rs     │     │   │
//! │  │   │ delete acct │   │             │   │  order.rs        │     │   │
//! │  │   └──────┬──────┘   └─────────────┘   └────────┬─────────┘     │   │
//! │  │          │ rules                               │               │   │
//! │  │          ▼                                     ▼               │   │
//! │  │   emporium-core                      Database (pool.rs)        │   │
//! │  │                                      Migrations (embedded)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL) in the platform data directory                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, customer, order)
//! - [`unit_of_work`] - Transaction-scoped write boundary
//! - [`fulfillment`] - Place / pay / cancel / delete account
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/emporium.db")).await?;
//!
//! let order = db.fulfillment().place_order(&customer_id, &lines).await?;
//! let paid = db.fulfillment().record_payment(&order.id, order.total(), "cash").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fulfillment;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use fulfillment::{CancelOutcome, Fulfillment};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
