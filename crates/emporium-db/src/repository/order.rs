//! # Order Repository
//!
//! SQL for orders, order lines and payments.
//!
//! ## Two Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Write helpers (pub(crate), executor-generic)                          │
//! │  ├── insert_order / insert_line / insert_payment                       │
//! │  ├── mark_status      Pending → Paid | Cancelled, guarded             │
//! │  └── delete_for_customer                                               │
//! │       ▲                                                                 │
//! │       │ only called by UnitOfWork, inside one transaction              │
//! │                                                                         │
//! │  OrderRepository (pub, pool-backed, read-only)                         │
//! │  ├── get_by_id / get_details                                           │
//! │  ├── list_for_customer   (purchase history, newest first)              │
//! │  └── lifetime_spend      (sum of paid totals)                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders are never written outside the fulfillment engine, so the public
//! repository has no insert or update methods.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use emporium_core::{Money, Order, OrderDetails, OrderLine, OrderStatus, Payment};

// =============================================================================
// Executor-Generic Helpers
// =============================================================================

pub(crate) async fn insert_order<'e, E>(executor: E, order: &Order) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO orders (id, customer_id, status, total_cents, created_at, paid_at, cancelled_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(order.status)
    .bind(order.total_cents)
    .bind(order.created_at)
    .bind(order.paid_at)
    .bind(order.cancelled_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn insert_line<'e, E>(executor: E, line: &OrderLine) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO order_lines (
            id, order_id, product_id, name_snapshot,
            unit_price_cents, quantity, line_total_cents, position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&line.id)
    .bind(&line.order_id)
    .bind(&line.product_id)
    .bind(&line.name_snapshot)
    .bind(line.unit_price_cents)
    .bind(line.quantity)
    .bind(line.line_total_cents)
    .bind(line.position)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn insert_payment<'e, E>(executor: E, payment: &Payment) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO payments (id, order_id, amount_cents, method, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(payment.amount_cents)
    .bind(&payment.method)
    .bind(payment.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_order<'e, E>(executor: E, id: &str) -> DbResult<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, customer_id, status, total_cents, created_at, paid_at, cancelled_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(order)
}

/// Lines in the order they were requested.
pub(crate) async fn fetch_lines<'e, E>(executor: E, order_id: &str) -> DbResult<Vec<OrderLine>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let lines = sqlx::query_as::<_, OrderLine>(
        r#"
        SELECT id, order_id, product_id, name_snapshot,
               unit_price_cents, quantity, line_total_cents, position
        FROM order_lines
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

pub(crate) async fn fetch_payment<'e, E>(executor: E, order_id: &str) -> DbResult<Option<Payment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, order_id, amount_cents, method, created_at
        FROM payments
        WHERE order_id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_optional(executor)
    .await?;

    Ok(payment)
}

/// Moves a Pending order to `next` and stamps the matching timestamp.
///
/// Returns `None` when the order is missing or no longer Pending, so two
/// racing transitions can never both succeed.
pub(crate) async fn mark_status<'e, E>(
    executor: E,
    order_id: &str,
    next: OrderStatus,
    now: DateTime<Utc>,
) -> DbResult<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let paid_at = (next == OrderStatus::Paid).then_some(now);
    let cancelled_at = (next == OrderStatus::Cancelled).then_some(now);

    let order = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders SET
            status = ?2,
            paid_at = COALESCE(?3, paid_at),
            cancelled_at = COALESCE(?4, cancelled_at)
        WHERE id = ?1 AND status = 'pending'
        RETURNING id, customer_id, status, total_cents, created_at, paid_at, cancelled_at
        "#,
    )
    .bind(order_id)
    .bind(next)
    .bind(paid_at)
    .bind(cancelled_at)
    .fetch_optional(executor)
    .await?;

    Ok(order)
}

/// Deletes every payment, line and order of a customer, children first.
///
/// Returns the number of orders removed.
pub(crate) async fn delete_for_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> DbResult<u64> {
    let payments = sqlx::query(
        "DELETE FROM payments WHERE order_id IN (SELECT id FROM orders WHERE customer_id = ?1)",
    )
    .bind(customer_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let lines = sqlx::query(
        "DELETE FROM order_lines WHERE order_id IN (SELECT id FROM orders WHERE customer_id = ?1)",
    )
    .bind(customer_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let orders = sqlx::query("DELETE FROM orders WHERE customer_id = ?1")
        .bind(customer_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    debug!(
        customer_id = %customer_id,
        payments, lines, orders,
        "Deleted customer order history"
    );

    Ok(orders)
}

// =============================================================================
// Read Repository
// =============================================================================

/// Read-only access to orders for reporting and display.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        fetch_order(&self.pool, id).await
    }

    /// Gets an order with its lines and payment.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<OrderDetails>> {
        let Some(order) = fetch_order(&self.pool, id).await? else {
            return Ok(None);
        };

        let lines = fetch_lines(&self.pool, id).await?;
        let payment = fetch_payment(&self.pool, id).await?;

        Ok(Some(OrderDetails {
            order,
            lines,
            payment,
        }))
    }

    /// Purchase history of a customer, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, customer_id, status, total_cents, created_at, paid_at, cancelled_at
            FROM orders
            WHERE customer_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(customer_id = %customer_id, count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Sum of the totals of a customer's Paid orders.
    ///
    /// Pending and Cancelled orders never count.
    pub async fn lifetime_spend(&self, customer_id: &str) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM orders
            WHERE customer_id = ?1 AND status = 'paid'
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Counts orders in a given status.
    pub async fn count_by_status(&self, status: OrderStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
