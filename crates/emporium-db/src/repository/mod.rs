//! # Repository Module
//!
//! Database repository implementations for Emporium.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │  db.products().restock(id, 5)                                  │
//! │       ▼                                                                 │
//! │  ProductRepository / CustomerRepository / OrderRepository              │
//! │       │                                                                 │
//! │       │  SQL query (pool)                                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Each module also exposes pub(crate) helpers generic over             │
//! │  sqlx::Executor, so UnitOfWork runs the same SQL inside its            │
//! │  transaction.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and restock
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD
//! - [`OrderRepository`](order::OrderRepository) - Order reads, history, lifetime spend

pub mod customer;
pub mod order;
pub mod product;
