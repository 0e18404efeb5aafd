//! # emporium-core: Pure Business Logic for Emporium
//!
//! This crate holds the order-fulfillment rules as pure functions with zero
//! I/O dependencies. Persistence and transactions live in `emporium-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    emporium-cli                                 │   │
//! │  │    product / customer / order / account subcommands             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               emporium-db (Fulfillment + UnitOfWork)            │   │
//! │  │     place_order, record_payment, cancel_order, delete_account   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ asks for decisions                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ emporium-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌───────────┐ │   │
//! │  │   │   types   │  │   money   │  │ fulfillment │  │ validation│ │   │
//! │  │   │  Product  │  │   Money   │  │ OrderDraft  │  │   rules   │ │   │
//! │  │   │  Order    │  │           │  │ check_pay.. │  │  checks   │ │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Order, Payment, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`fulfillment`] - Order drafting, payment matching, cancellation policy
//!
//! ## Example Usage
//!
//! ```rust
//! use emporium_core::money::Money;
//!
//! let price: Money = "10.00".parse().unwrap();
//! let total = price.multiply_quantity(3);
//! assert_eq!(total.cents(), 3000);
//! assert_eq!(total.to_string(), "$30.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fulfillment;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use fulfillment::{CancellationDecision, DraftLine, LineRequest, OrderDraft, StockMovement};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line requests in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single order line.
///
/// Guards against typos like 1000 instead of 10.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Ceiling for a product's stock level.
///
/// Keeps `stock + delta` far away from `i64::MAX`, where SQLite would
/// silently switch the column to REAL.
pub const MAX_STOCK: i64 = 1_000_000_000;
