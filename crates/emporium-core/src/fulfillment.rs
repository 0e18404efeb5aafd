//! # Fulfillment Rules
//!
//! The decisions behind placing, paying and cancelling orders, as pure
//! functions. `emporium-db` gathers the inputs inside a transaction, asks
//! this module what to do, then applies the answer.
//!
//! ## Place Order: Validate, Then Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Phase 1: OrderDraft::build  (THIS MODULE, no writes)                   │
//! │                                                                         │
//! │   requests: [(pen, 3), (ink, 1), (pen, 2)]                              │
//! │        │                                                                │
//! │        ├── every quantity in 1..=999?                                   │
//! │        ├── every product exists?               → ProductNotFound        │
//! │        ├── pen: 3 + 2 = 5 <= stock?            → InsufficientStock      │
//! │        └── ink: 1 <= stock?                                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   OrderDraft { lines, reservations, total }                             │
//! │                                                                         │
//! │  Phase 2: UnitOfWork (emporium-db)                                      │
//! │   decrement stock per reservation, insert order + lines, COMMIT        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure in phase 1 means nothing was written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{generate_id, Order, OrderLine, OrderStatus, Product};
use crate::validation::{validate_line_count, validate_payment_amount, validate_quantity};

// =============================================================================
// Requests
// =============================================================================

/// One requested line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Order Draft
// =============================================================================

/// A validated line, priced from the catalog at drafting time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: String,
    pub name_snapshot: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

/// Stock to take from (or give back to) one product.
///
/// Quantities of repeated product ids are summed, so each product is
/// touched exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: String,
    pub quantity: i64,
}

impl StockMovement {
    /// Aggregates the quantities of persisted order lines per product, in
    /// line order. Used to restore stock on cancellation.
    pub fn from_lines(lines: &[OrderLine]) -> Vec<StockMovement> {
        aggregate(lines.iter().map(|l| (l.product_id.as_str(), l.quantity)))
    }
}

fn aggregate<'a>(items: impl Iterator<Item = (&'a str, i64)>) -> Vec<StockMovement> {
    let mut movements: Vec<StockMovement> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for (product_id, quantity) in items {
        match index.get(product_id) {
            Some(&i) => movements[i].quantity += quantity,
            None => {
                index.insert(product_id, movements.len());
                movements.push(StockMovement {
                    product_id: product_id.to_string(),
                    quantity,
                });
            }
        }
    }

    movements
}

/// A fully validated order, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub customer_id: String,
    pub lines: Vec<DraftLine>,
    /// Stock to decrement, one entry per distinct product.
    pub reservations: Vec<StockMovement>,
    pub total: Money,
}

impl OrderDraft {
    /// Validates every request against the catalog snapshot and prices the
    /// order.
    ///
    /// ## Arguments
    /// * `customer_id` - An already resolved customer
    /// * `requests` - Lines in the order the caller gave them
    /// * `catalog` - Products keyed by id, as read inside the transaction
    ///
    /// ## Errors
    /// The first failing request decides the error:
    /// `Validation`, `ProductNotFound` or `InsufficientStock`.
    pub fn build(
        customer_id: &str,
        requests: &[LineRequest],
        catalog: &HashMap<String, Product>,
    ) -> CoreResult<Self> {
        validate_line_count(requests.len())?;

        let mut lines = Vec::with_capacity(requests.len());
        let mut requested: HashMap<&str, i64> = HashMap::new();
        let mut total = Money::zero();

        for request in requests {
            validate_quantity(request.quantity)?;

            let product = catalog
                .get(&request.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

            let wanted = requested.entry(product.id.as_str()).or_insert(0);
            *wanted += request.quantity;
            if !product.has_stock_for(*wanted) {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    available: product.stock,
                    requested: *wanted,
                });
            }

            let line_total = product
                .price()
                .checked_multiply_quantity(request.quantity)
                .ok_or_else(total_overflow)?;
            total = total.checked_add(line_total).ok_or_else(total_overflow)?;

            lines.push(DraftLine {
                product_id: product.id.clone(),
                name_snapshot: product.name.clone(),
                unit_price: product.price(),
                quantity: request.quantity,
                line_total,
            });
        }

        let reservations = aggregate(lines.iter().map(|l| (l.product_id.as_str(), l.quantity)));

        Ok(OrderDraft {
            customer_id: customer_id.to_string(),
            lines,
            reservations,
            total,
        })
    }

    /// Materializes the draft into a Pending order and its lines with fresh
    /// ids.
    pub fn into_order(self, now: DateTime<Utc>) -> (Order, Vec<OrderLine>) {
        let order = Order {
            id: generate_id(),
            customer_id: self.customer_id,
            status: OrderStatus::Pending,
            total_cents: self.total.cents(),
            created_at: now,
            paid_at: None,
            cancelled_at: None,
        };

        let lines = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(position, line)| OrderLine {
                id: generate_id(),
                order_id: order.id.clone(),
                product_id: line.product_id,
                name_snapshot: line.name_snapshot,
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
                line_total_cents: line.line_total.cents(),
                position: position as i64,
            })
            .collect();

        (order, lines)
    }
}

fn total_overflow() -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: "order total".to_string(),
        min: 0,
        max: i64::MAX,
    })
}

// =============================================================================
// Payment
// =============================================================================

/// Decides whether `amount` settles `order`.
///
/// ## Rules (checked in this order)
/// 1. Order must be Pending, else `OrderNotPending` (replays never pay twice)
/// 2. Amount must not be negative
/// 3. Amount must equal the total exactly (`UnderPayment` / `OverPayment`)
pub fn check_payment(order: &Order, amount: Money) -> CoreResult<()> {
    if order.status != OrderStatus::Pending {
        return Err(CoreError::OrderNotPending {
            order_id: order.id.clone(),
            status: order.status,
        });
    }

    validate_payment_amount(amount.cents())?;

    let expected = order.total();
    if amount < expected {
        return Err(CoreError::UnderPayment {
            order_id: order.id.clone(),
            expected,
            received: amount,
        });
    }
    if amount > expected {
        return Err(CoreError::OverPayment {
            order_id: order.id.clone(),
            expected,
            received: amount,
        });
    }

    Ok(())
}

// =============================================================================
// Cancellation
// =============================================================================

/// Outcome of the cancellation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationDecision {
    /// Restore stock and mark the order Cancelled.
    Proceed,
    /// A payment exists and the caller did not confirm. Nothing changes.
    Aborted,
}

/// Decides what cancelling `order` should do.
///
/// ```text
///  status != Pending ─────────────────────► OrderNotCancellable
///  Pending, no payment ───────────────────► Proceed (automatic)
///  Pending, payment, confirmed ───────────► Proceed
///  Pending, payment, not confirmed ───────► Aborted
/// ```
///
/// A Pending order with a payment attached cannot come out of the normal
/// flow (recording a payment marks the order Paid in the same
/// transaction). It is handled for rows written by other tools.
pub fn decide_cancellation(
    order: &Order,
    has_payment: bool,
    confirmed: bool,
) -> CoreResult<CancellationDecision> {
    if order.status != OrderStatus::Pending {
        return Err(CoreError::OrderNotCancellable {
            order_id: order.id.clone(),
            status: order.status,
        });
    }

    if has_payment && !confirmed {
        return Ok(CancellationDecision::Aborted);
    }

    Ok(CancellationDecision::Proceed)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: "Misc".to_string(),
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn order(status: OrderStatus, total_cents: i64) -> Order {
        Order {
            id: "o-1".to_string(),
            customer_id: "c-1".to_string(),
            status,
            total_cents,
            created_at: Utc::now(),
            paid_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_draft_totals_and_reservations() {
        let catalog = catalog(vec![product("pen", 1000, 5), product("ink", 250, 10)]);
        let requests = vec![LineRequest::new("pen", 3), LineRequest::new("ink", 2)];

        let draft = OrderDraft::build("c-1", &requests, &catalog).unwrap();

        assert_eq!(draft.total.cents(), 3000 + 500);
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.lines[0].line_total.cents(), 3000);
        assert_eq!(
            draft.reservations,
            vec![
                StockMovement { product_id: "pen".into(), quantity: 3 },
                StockMovement { product_id: "ink".into(), quantity: 2 },
            ]
        );
    }

    #[test]
    fn test_draft_aggregates_repeated_products_against_stock() {
        let catalog = catalog(vec![product("pen", 100, 5)]);

        let ok = vec![LineRequest::new("pen", 3), LineRequest::new("pen", 2)];
        let draft = OrderDraft::build("c-1", &ok, &catalog).unwrap();
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.reservations.len(), 1);
        assert_eq!(draft.reservations[0].quantity, 5);

        let too_many = vec![LineRequest::new("pen", 3), LineRequest::new("pen", 3)];
        let err = OrderDraft::build("c-1", &too_many, &catalog).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: "pen".into(),
                available: 5,
                requested: 6,
            }
        );
    }

    #[test]
    fn test_draft_rejects_unknown_product_and_bad_quantity() {
        let catalog = catalog(vec![product("pen", 100, 5)]);

        let err = OrderDraft::build("c-1", &[LineRequest::new("nope", 1)], &catalog).unwrap_err();
        assert_eq!(err, CoreError::ProductNotFound("nope".into()));

        let err = OrderDraft::build("c-1", &[LineRequest::new("pen", 0)], &catalog).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = OrderDraft::build("c-1", &[], &catalog).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_draft_insufficient_stock() {
        let catalog = catalog(vec![product("pen", 100, 5)]);
        let err = OrderDraft::build("c-1", &[LineRequest::new("pen", 10)], &catalog).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 5, requested: 10, .. }
        ));
    }

    #[test]
    fn test_draft_total_overflow_is_rejected() {
        let catalog = catalog(vec![product("gold", i64::MAX / 2, 10)]);
        let err = OrderDraft::build("c-1", &[LineRequest::new("gold", 3)], &catalog).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_into_order_keeps_line_positions() {
        let catalog = catalog(vec![product("a", 400, 5), product("b", 100, 5)]);
        let requests = vec![LineRequest::new("b", 1), LineRequest::new("a", 2)];
        let draft = OrderDraft::build("c-1", &requests, &catalog).unwrap();

        let (order, lines) = draft.into_order(Utc::now());

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 900);
        assert_eq!(lines[0].product_id, "b");
        assert_eq!(lines[0].position, 0);
        assert_eq!(lines[1].product_id, "a");
        assert_eq!(lines[1].position, 1);
        assert!(lines.iter().all(|l| l.order_id == order.id));
        let sum: i64 = lines.iter().map(|l| l.line_total_cents).sum();
        assert_eq!(sum, order.total_cents);
    }

    #[test]
    fn test_check_payment() {
        let pending = order(OrderStatus::Pending, 800);

        assert!(check_payment(&pending, Money::from_cents(800)).is_ok());
        assert!(matches!(
            check_payment(&pending, Money::from_cents(799)),
            Err(CoreError::UnderPayment { .. })
        ));
        assert!(matches!(
            check_payment(&pending, Money::from_cents(801)),
            Err(CoreError::OverPayment { .. })
        ));
        assert!(matches!(
            check_payment(&pending, Money::from_cents(-1)),
            Err(CoreError::Validation(_))
        ));

        let paid = order(OrderStatus::Paid, 800);
        assert!(matches!(
            check_payment(&paid, Money::from_cents(800)),
            Err(CoreError::OrderNotPending { status: OrderStatus::Paid, .. })
        ));
    }

    #[test]
    fn test_free_order_can_be_settled_with_zero() {
        let pending = order(OrderStatus::Pending, 0);
        assert!(check_payment(&pending, Money::zero()).is_ok());
    }

    #[test]
    fn test_decide_cancellation() {
        let pending = order(OrderStatus::Pending, 800);

        assert_eq!(
            decide_cancellation(&pending, false, false).unwrap(),
            CancellationDecision::Proceed
        );
        assert_eq!(
            decide_cancellation(&pending, true, false).unwrap(),
            CancellationDecision::Aborted
        );
        assert_eq!(
            decide_cancellation(&pending, true, true).unwrap(),
            CancellationDecision::Proceed
        );

        for status in [OrderStatus::Paid, OrderStatus::Cancelled] {
            let err = decide_cancellation(&order(status, 800), false, true).unwrap_err();
            assert!(matches!(err, CoreError::OrderNotCancellable { .. }));
        }
    }

    #[test]
    fn test_restock_movements_from_lines() {
        let catalog = catalog(vec![product("a", 100, 9), product("b", 100, 9)]);
        let requests = vec![
            LineRequest::new("a", 1),
            LineRequest::new("b", 2),
            LineRequest::new("a", 3),
        ];
        let (_, lines) = OrderDraft::build("c-1", &requests, &catalog)
            .unwrap()
            .into_order(Utc::now());

        let movements = StockMovement::from_lines(&lines);
        assert_eq!(
            movements,
            vec![
                StockMovement { product_id: "a".into(), quantity: 4 },
                StockMovement { product_id: "b".into(), quantity: 2 },
            ]
        );
    }
}
