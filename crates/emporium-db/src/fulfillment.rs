//! # Fulfillment Engine
//!
//! The four mutating operations (place, pay, cancel, delete account) and
//! the read accessors used to display their results.
//!
//! ## One Operation, One Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  place_order(customer, lines)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.begin() ───────────────────────────────────────────────┐           │
//! │       │                                                     │           │
//! │       ├── read customer + products                          │           │
//! │       ├── OrderDraft::build (emporium-core, pure)           │ any Err   │
//! │       ├── adjust_stock(-qty) per product (guarded)          │──► drop   │
//! │       ├── insert order + lines                              │  ROLLBACK │
//! │       ▼                                                     │           │
//! │  commit() ◄─────────────────────────────────────────────────┘           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  info!(order_id, total)                                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejections are logged with `warn!` and returned as
//! `DbError::Domain(CoreError)`. A declined cancellation is not an error:
//! it comes back as [`CancelOutcome::Aborted`].

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use emporium_core::fulfillment::{check_payment, decide_cancellation};
use emporium_core::validation::validate_payment_method;
use emporium_core::{
    generate_id, CancellationDecision, CoreError, LineRequest, Money, Order, OrderDetails,
    OrderDraft, OrderStatus, Payment, StockMovement,
};

/// Result of [`Fulfillment::cancel_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Stock restored, order now Cancelled.
    Cancelled(Order),
    /// A payment is attached and cancellation was not confirmed.
    /// Nothing changed.
    Aborted { order_id: String },
}

/// Runs order operations, each inside its own unit of work.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.fulfillment();
/// let order = engine.place_order(&customer.id, &[LineRequest::new(&pen.id, 3)]).await?;
/// let paid = engine.record_payment(&order.id, order.total(), "cash").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Fulfillment {
    db: Database,
}

impl Fulfillment {
    /// Creates an engine over `db`.
    pub fn new(db: Database) -> Self {
        Fulfillment { db }
    }

    // =========================================================================
    // Mutating Operations
    // =========================================================================

    /// Places an order and reserves its stock.
    ///
    /// Every line is validated before any stock moves. On success the order
    /// is Pending and has no payment.
    ///
    /// ## Errors
    /// `CustomerNotFound`, `ProductNotFound`, `InsufficientStock`,
    /// `Validation`. State is unchanged on any error.
    pub async fn place_order(&self, customer_id: &str, requests: &[LineRequest]) -> DbResult<Order> {
        self.place_order_tx(customer_id, requests)
            .await
            .inspect_err(|e| log_rejection("place_order", e))
    }

    async fn place_order_tx(&self, customer_id: &str, requests: &[LineRequest]) -> DbResult<Order> {
        let mut uow = self.db.begin().await?;

        let customer = uow
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;

        // Snapshot every referenced product inside the transaction
        let mut catalog = HashMap::new();
        for request in requests {
            if catalog.contains_key(&request.product_id) {
                continue;
            }
            if let Some(product) = uow.get_product(&request.product_id).await? {
                catalog.insert(product.id.clone(), product);
            }
        }

        let draft = OrderDraft::build(&customer.id, requests, &catalog)?;
        let reservations = draft.reservations.clone();
        let (order, lines) = draft.into_order(uow.now());

        for reservation in &reservations {
            uow.adjust_stock(&reservation.product_id, -reservation.quantity)
                .await?;
        }

        uow.insert_order(&order).await?;
        uow.insert_order_lines(&lines).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            lines = lines.len(),
            total = %order.total(),
            "Order placed"
        );
        Ok(order)
    }

    /// Records an exact-amount payment and marks the order Paid.
    ///
    /// Stock and the order total are not touched.
    ///
    /// ## Errors
    /// `OrderNotFound`, `OrderNotPending`, `PaymentAlreadyRecorded`,
    /// `UnderPayment`, `OverPayment`, `Validation`.
    pub async fn record_payment(&self, order_id: &str, amount: Money, method: &str) -> DbResult<Order> {
        self.record_payment_tx(order_id, amount, method)
            .await
            .inspect_err(|e| log_rejection("record_payment", e))
    }

    async fn record_payment_tx(&self, order_id: &str, amount: Money, method: &str) -> DbResult<Order> {
        validate_payment_method(method).map_err(CoreError::from)?;

        let mut uow = self.db.begin().await?;

        let order = uow
            .get_order(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        check_payment(&order, amount)?;

        if uow.get_payment(&order.id).await?.is_some() {
            return Err(CoreError::PaymentAlreadyRecorded(order.id).into());
        }

        let payment = Payment {
            id: generate_id(),
            order_id: order.id.clone(),
            amount_cents: amount.cents(),
            method: method.trim().to_string(),
            created_at: uow.now(),
        };
        uow.insert_payment(&payment).await?;
        let paid = uow.set_order_status(&order.id, OrderStatus::Paid).await?;
        uow.commit().await?;

        info!(
            order_id = %paid.id,
            amount = %amount,
            method = %payment.method,
            "Payment recorded"
        );
        Ok(paid)
    }

    /// Cancels a Pending order and puts its stock back.
    ///
    /// ## Arguments
    /// * `confirmed` - Required only when a payment is already attached to
    ///   the still-Pending order. Without it the call changes nothing and
    ///   returns [`CancelOutcome::Aborted`]. The payment stays in place.
    ///
    /// ## Errors
    /// `OrderNotFound`, `OrderNotCancellable`.
    pub async fn cancel_order(&self, order_id: &str, confirmed: bool) -> DbResult<CancelOutcome> {
        self.cancel_order_tx(order_id, confirmed)
            .await
            .inspect_err(|e| log_rejection("cancel_order", e))
    }

    async fn cancel_order_tx(&self, order_id: &str, confirmed: bool) -> DbResult<CancelOutcome> {
        let mut uow = self.db.begin().await?;

        let order = uow
            .get_order(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        let has_payment = uow.get_payment(&order.id).await?.is_some();

        if decide_cancellation(&order, has_payment, confirmed)? == CancellationDecision::Aborted {
            uow.rollback().await?;
            warn!(
                order_id = %order.id,
                "Cancellation aborted: payment attached and not confirmed"
            );
            return Ok(CancelOutcome::Aborted { order_id: order.id });
        }

        let lines = uow.get_order_lines(&order.id).await?;
        let restored = StockMovement::from_lines(&lines);
        for movement in &restored {
            uow.adjust_stock(&movement.product_id, movement.quantity)
                .await?;
        }

        let cancelled = uow
            .set_order_status(&order.id, OrderStatus::Cancelled)
            .await?;
        uow.commit().await?;

        info!(
            order_id = %cancelled.id,
            products_restocked = restored.len(),
            had_payment = has_payment,
            "Order cancelled"
        );
        Ok(CancelOutcome::Cancelled(cancelled))
    }

    /// Deletes a customer and every order, line and payment they own.
    ///
    /// Stock held by their Pending orders is NOT restored.
    ///
    /// ## Returns
    /// Number of orders deleted.
    pub async fn delete_account(&self, customer_id: &str) -> DbResult<u64> {
        self.delete_account_tx(customer_id)
            .await
            .inspect_err(|e| log_rejection("delete_account", e))
    }

    async fn delete_account_tx(&self, customer_id: &str) -> DbResult<u64> {
        let mut uow = self.db.begin().await?;

        if uow.get_customer(customer_id).await?.is_none() {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }

        let orders = uow.delete_customer_cascade(customer_id).await?;
        uow.commit().await?;

        info!(customer_id = %customer_id, orders, "Account deleted");
        Ok(orders)
    }

    // =========================================================================
    // Read Accessors
    // =========================================================================

    /// Gets an order with its lines and payment.
    pub async fn get_order(&self, order_id: &str) -> DbResult<OrderDetails> {
        self.db
            .orders()
            .get_details(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Purchase history of a customer, newest first.
    pub async fn list_orders_for_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        self.require_customer(customer_id).await?;
        self.db.orders().list_for_customer(customer_id).await
    }

    /// Sum of the customer's Paid order totals.
    pub async fn lifetime_spend(&self, customer_id: &str) -> DbResult<Money> {
        self.require_customer(customer_id).await?;
        self.db.orders().lifetime_spend(customer_id).await
    }

    async fn require_customer(&self, customer_id: &str) -> DbResult<()> {
        match self.db.customers().get_by_id(customer_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::CustomerNotFound(customer_id.to_string()).into()),
        }
    }
}

fn log_rejection(operation: &'static str, err: &DbError) {
    match err.domain() {
        Some(reason) => warn!(operation, kind = reason.kind(), error = %reason, "Operation rejected"),
        None => warn!(operation, error = %err, "Operation failed"),
    }
}
