//! # Error Types
//!
//! Domain-specific error types for emporium-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  emporium-core errors (this file)                                      │
//! │  ├── CoreError        - Order / stock / payment rule violations        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  emporium-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── CliError         - Error code + message, non-zero exit            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CliError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A declined cancellation is NOT an error. It is reported as
//! `CancellationDecision::Aborted` (see [`crate::fulfillment`]).

use thiserror::Error;

use crate::money::Money;
use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant reflects a caller or state precondition. None of them are
/// transient, so callers should never retry on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Customer id does not resolve.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Product id does not resolve.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order id does not resolve.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Requested quantity exceeds current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Place order (qty: 10)
    ///      │
    ///      ▼
    /// Check stock: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 5, requested: 10 }
    ///      │
    ///      ▼
    /// Nothing written, stock stays 5
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Payment attempted on an order that is no longer pending.
    #[error("Order {order_id} is {status}, payment not accepted")]
    OrderNotPending {
        order_id: String,
        status: OrderStatus,
    },

    /// The order already carries a payment. One payment per order.
    #[error("Order {0} already has a payment recorded")]
    PaymentAlreadyRecorded(String),

    /// Cancellation attempted on a paid or already cancelled order.
    #[error("Order {order_id} is {status} and cannot be cancelled")]
    OrderNotCancellable {
        order_id: String,
        status: OrderStatus,
    },

    /// Amount paid is below the order total.
    #[error("Payment of {received} for order {order_id} is below the total of {expected}")]
    UnderPayment {
        order_id: String,
        expected: Money,
        received: Money,
    },

    /// Amount paid is above the order total.
    #[error("Payment of {received} for order {order_id} exceeds the total of {expected}")]
    OverPayment {
        order_id: String,
        expected: Money,
        received: Money,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::CustomerNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_) => "NOT_FOUND",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::OrderNotPending { .. } => "ORDER_NOT_PENDING",
            CoreError::PaymentAlreadyRecorded(_) => "PAYMENT_ALREADY_RECORDED",
            CoreError::OrderNotCancellable { .. } => "ORDER_NOT_CANCELLABLE",
            CoreError::UnderPayment { .. } => "UNDER_PAYMENT",
            CoreError::OverPayment { .. } => "OVER_PAYMENT",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before any business rule runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 5,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 5, requested 10"
        );

        let err = CoreError::UnderPayment {
            order_id: "o-1".to_string(),
            expected: Money::from_cents(800),
            received: Money::from_cents(799),
        };
        assert_eq!(
            err.to_string(),
            "Payment of $7.99 for order o-1 is below the total of $8.00"
        );

        let err = CoreError::OrderNotCancellable {
            order_id: "o-2".to_string(),
            status: OrderStatus::Paid,
        };
        assert_eq!(err.to_string(), "Order o-2 is paid and cannot be cancelled");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_kinds_are_distinct_for_payment_errors() {
        let under = CoreError::UnderPayment {
            order_id: "o".into(),
            expected: Money::from_cents(1),
            received: Money::zero(),
        };
        let over = CoreError::OverPayment {
            order_id: "o".into(),
            expected: Money::zero(),
            received: Money::from_cents(1),
        };
        assert_ne!(under.kind(), over.kind());
    }
}
