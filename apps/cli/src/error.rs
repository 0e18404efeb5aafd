//! # CLI Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command function: Result<Output, CliError>                            │
//! │         │                                                               │
//! │         ├── DbError::Domain(CoreError) ──► code from the rule broken   │
//! │         ├── DbError::{QueryFailed, ...} ─► DATABASE_ERROR (logged)     │
//! │         ▼                                                               │
//! │  main(): print "error[CODE] message" (or JSON) to stderr              │
//! │          exit with CliError::exit_code()                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `--json` the error is printed as:
//! ```json
//! { "code": "UNDER_PAYMENT", "message": "Payment of $7.99 for order ... is below the total of $8.00" }
//! ```

use serde::Serialize;
use thiserror::Error;

use emporium_core::CoreError;
use emporium_db::DbError;

/// Error returned from CLI commands.
#[derive(Debug, Clone, Serialize, Error)]
#[error("[{code}] {message}")]
pub struct CliError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for CLI output and exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InsufficientStock,
    OrderNotPending,
    PaymentAlreadyRecorded,
    OrderNotCancellable,
    UnderPayment,
    OverPayment,
    /// A required confirmation flag was missing
    ConfirmationRequired,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::OrderNotPending => "ORDER_NOT_PENDING",
            ErrorCode::PaymentAlreadyRecorded => "PAYMENT_ALREADY_RECORDED",
            ErrorCode::OrderNotCancellable => "ORDER_NOT_CANCELLABLE",
            ErrorCode::UnderPayment => "UNDER_PAYMENT",
            ErrorCode::OverPayment => "OVER_PAYMENT",
            ErrorCode::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CliError {
    /// Creates a new CLI error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }

    /// Process exit status.
    ///
    /// ```text
    /// 1  infrastructure (database, internal)
    /// 2  bad input (validation, missing confirmation)
    /// 3  not found
    /// 4  rejected by an order rule
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ErrorCode::DatabaseError | ErrorCode::Internal => 1,
            ErrorCode::ValidationError | ErrorCode::ConfirmationRequired => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::InsufficientStock
            | ErrorCode::OrderNotPending
            | ErrorCode::PaymentAlreadyRecorded
            | ErrorCode::OrderNotCancellable
            | ErrorCode::UnderPayment
            | ErrorCode::OverPayment => 4,
        }
    }
}

/// Converts core errors to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::CustomerNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::OrderNotPending { .. } => ErrorCode::OrderNotPending,
            CoreError::PaymentAlreadyRecorded(_) => ErrorCode::PaymentAlreadyRecorded,
            CoreError::OrderNotCancellable { .. } => ErrorCode::OrderNotCancellable,
            CoreError::UnderPayment { .. } => ErrorCode::UnderPayment,
            CoreError::OverPayment { .. } => ErrorCode::OverPayment,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        CliError::new(code, err.to_string())
    }
}

/// Converts database errors to CLI errors.
impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } => CliError::new(
                ErrorCode::ValidationError,
                format!("{} already exists", field),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::debug!("Foreign key violation: {}", message);
                CliError::new(
                    ErrorCode::ValidationError,
                    "Record is still referenced by existing orders",
                )
            }
            DbError::ConnectionFailed(e) => {
                CliError::new(ErrorCode::DatabaseError, format!("Database connection failed: {e}"))
            }
            DbError::MigrationFailed(e) => {
                CliError::new(ErrorCode::DatabaseError, format!("Database migration failed: {e}"))
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted | DbError::Busy => {
                CliError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use emporium_core::{Money, OrderStatus};

    #[test]
    fn test_domain_errors_keep_their_code() {
        let err: CliError = DbError::from(CoreError::UnderPayment {
            order_id: "o-1".into(),
            expected: Money::from_cents(800),
            received: Money::from_cents(799),
        })
        .into();
        assert_eq!(err.code, ErrorCode::UnderPayment);
        assert_eq!(err.exit_code(), 4);

        let err: CliError = CoreError::OrderNotCancellable {
            order_id: "o-1".into(),
            status: OrderStatus::Paid,
        }
        .into();
        assert_eq!(err.code.as_str(), "ORDER_NOT_CANCELLABLE");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::not_found("Order", "x").exit_code(), 3);
        assert_eq!(CliError::internal("boom").exit_code(), 1);
        let err: CliError = DbError::ForeignKeyViolation { message: "fk".into() }.into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_json_shape() {
        let err = CliError::not_found("Customer", "c-9");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Customer not found: c-9");
    }
}
