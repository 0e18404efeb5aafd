//! # Unit of Work
//!
//! A transaction-scoped write boundary. Every public fulfillment operation
//! opens exactly one, does all its reads and writes through it, then
//! commits. Dropping it without `commit()` rolls everything back.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.begin() ──► BEGIN IMMEDIATE (takes the write lock up front)        │
//! │      │                                                                  │
//! │      ├── get_customer / get_product / get_order ...   (reads)          │
//! │      ├── adjust_stock (guarded)                        (writes)        │
//! │      ├── insert_order / insert_order_lines / insert_payment            │
//! │      └── set_order_status (only from Pending)                          │
//! │      │                                                                  │
//! │      ├── Ok  ──► commit()  ──► COMMIT                                  │
//! │      └── Err ──► drop      ──► ROLLBACK (state unchanged)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All timestamps written through one unit of work share the instant
//! captured at `begin`.
//!
//! ## Concurrency
//! A deferred `BEGIN` would read under a shared lock and ask for the write
//! lock only at the first write. Two such transactions on different
//! connections deadlock and SQLite fails one of them with "database is
//! locked" at once. `BEGIN IMMEDIATE` takes the write lock before the first
//! read, so competing units of work wait in turn (up to the connection's
//! busy timeout) and each one sees the stock left by the previous commit.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{customer, order, product};
use emporium_core::{CoreError, Customer, Order, OrderLine, OrderStatus, Payment, Product};

/// One open SQLite transaction plus the instant it started.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    now: DateTime<Utc>,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").field("now", &self.now).finish()
    }
}

impl UnitOfWork {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::Busy => DbError::Busy,
                other => DbError::TransactionFailed(other.to_string()),
            })?;

        debug!("Unit of work started");
        Ok(UnitOfWork {
            tx,
            now: Utc::now(),
        })
    }

    /// The instant this unit of work started.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn get_product(&mut self, id: &str) -> DbResult<Option<Product>> {
        product::fetch_product(&mut *self.tx, id).await
    }

    /// Adds `delta` (negative to take) to a product's stock.
    ///
    /// ## Returns
    /// * `Ok(stock)` - New stock level
    /// * `Err(Domain(ProductNotFound))` - Unknown product
    /// * `Err(Domain(InsufficientStock))` - Stock would drop below zero
    /// * `Err(Domain(Validation))` - Stock would pass `MAX_STOCK`
    pub async fn adjust_stock(&mut self, id: &str, delta: i64) -> DbResult<i64> {
        if let Some(stock) = product::adjust_stock(&mut *self.tx, id, delta, self.now).await? {
            return Ok(stock);
        }

        // Zero rows: missing product, floor or ceiling
        match product::fetch_product(&mut *self.tx, id).await? {
            None => Err(CoreError::ProductNotFound(id.to_string()).into()),
            Some(_) if delta > 0 => Err(CoreError::from(product::stock_out_of_range()).into()),
            Some(p) => Err(CoreError::InsufficientStock {
                product_id: p.id,
                available: p.stock,
                requested: -delta,
            }
            .into()),
        }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn get_customer(&mut self, id: &str) -> DbResult<Option<Customer>> {
        customer::fetch_customer(&mut *self.tx, id).await
    }

    /// Deletes a customer with every order, line and payment they own.
    /// Stock is not restored.
    ///
    /// ## Returns
    /// Number of orders removed.
    pub async fn delete_customer_cascade(&mut self, customer_id: &str) -> DbResult<u64> {
        let orders = order::delete_for_customer(&mut *self.tx, customer_id).await?;

        if customer::delete_customer(&mut *self.tx, customer_id).await? == 0 {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }

        Ok(orders)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub async fn get_order(&mut self, id: &str) -> DbResult<Option<Order>> {
        order::fetch_order(&mut *self.tx, id).await
    }

    pub async fn get_order_lines(&mut self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        order::fetch_lines(&mut *self.tx, order_id).await
    }

    pub async fn get_payment(&mut self, order_id: &str) -> DbResult<Option<Payment>> {
        order::fetch_payment(&mut *self.tx, order_id).await
    }

    pub async fn insert_order(&mut self, new_order: &Order) -> DbResult<()> {
        order::insert_order(&mut *self.tx, new_order).await
    }

    pub async fn insert_order_lines(&mut self, lines: &[OrderLine]) -> DbResult<()> {
        for line in lines {
            order::insert_line(&mut *self.tx, line).await?;
        }
        Ok(())
    }

    /// Inserts a payment. A second payment for the same order is refused.
    pub async fn insert_payment(&mut self, payment: &Payment) -> DbResult<()> {
        match order::insert_payment(&mut *self.tx, payment).await {
            Err(DbError::UniqueViolation { .. }) => {
                Err(CoreError::PaymentAlreadyRecorded(payment.order_id.clone()).into())
            }
            other => other,
        }
    }

    /// Moves a Pending order to `next`.
    ///
    /// ## Errors
    /// * `OrderNotFound` - Unknown order
    /// * `OrderNotPending` - Moving to Paid from a terminal status
    /// * `OrderNotCancellable` - Moving to Cancelled from a terminal status
    pub async fn set_order_status(&mut self, order_id: &str, next: OrderStatus) -> DbResult<Order> {
        if let Some(updated) = order::mark_status(&mut *self.tx, order_id, next, self.now).await? {
            return Ok(updated);
        }

        let current = order::fetch_order(&mut *self.tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        let err = match next {
            OrderStatus::Cancelled => CoreError::OrderNotCancellable {
                order_id: current.id,
                status: current.status,
            },
            _ => CoreError::OrderNotPending {
                order_id: current.id,
                status: current.status,
            },
        };
        Err(err.into())
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Commits every write made through this unit of work.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work committed");
        Ok(())
    }

    /// Discards every write made through this unit of work.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
