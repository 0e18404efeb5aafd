//! # Order Commands
//!
//! The fulfillment operations plus order display.
//!
//! ## Order Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  emporium order place --customer C --line P:3                          │
//! │       │   stock reserved, order Pending                                │
//! │       ▼                                                                 │
//! │  emporium order pay O 30.00 --method card                              │
//! │       │   exact amount only, order Paid                                │
//! │       ▼                                                                 │
//! │  (or) emporium order cancel O                                          │
//! │           stock restored, order Cancelled                              │
//! │           --yes needed when a payment is already attached              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::args::OrderCommand;
use crate::error::CliResult;
use crate::output::{table, Output};
use emporium_core::{LineRequest, Money, Order, OrderDetails, OrderLine, OrderStatus, Payment};
use emporium_db::{CancelOutcome, Database};

// =============================================================================
// DTOs
// =============================================================================

/// Order header as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDto {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub total: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        OrderDto {
            total: o.total().to_string(),
            id: o.id,
            customer_id: o.customer_id,
            status: o.status,
            total_cents: o.total_cents,
            created_at: o.created_at,
            paid_at: o.paid_at,
            cancelled_at: o.cancelled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLineDto {
    pub product_id: String,
    pub name: String,
    pub unit_price: String,
    pub quantity: i64,
    pub line_total: String,
}

impl From<OrderLine> for OrderLineDto {
    fn from(l: OrderLine) -> Self {
        OrderLineDto {
            unit_price: l.unit_price().to_string(),
            line_total: l.line_total().to_string(),
            product_id: l.product_id,
            name: l.name_snapshot,
            quantity: l.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDto {
    pub id: String,
    pub amount: String,
    pub amount_cents: i64,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        PaymentDto {
            amount: p.amount().to_string(),
            id: p.id,
            amount_cents: p.amount_cents,
            method: p.method,
            created_at: p.created_at,
        }
    }
}

/// Order with lines and payment.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailsDto {
    #[serde(flatten)]
    pub order: OrderDto,
    pub lines: Vec<OrderLineDto>,
    pub payment: Option<PaymentDto>,
}

impl From<OrderDetails> for OrderDetailsDto {
    fn from(d: OrderDetails) -> Self {
        OrderDetailsDto {
            order: d.order.into(),
            lines: d.lines.into_iter().map(OrderLineDto::from).collect(),
            payment: d.payment.map(PaymentDto::from),
        }
    }
}

/// Rows for an order list table.
pub fn order_rows(orders: &[OrderDto]) -> Vec<Vec<String>> {
    orders
        .iter()
        .map(|o| {
            vec![
                o.id.clone(),
                o.status.to_string(),
                o.total.clone(),
                o.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect()
}

pub const ORDER_HEADERS: &[&str] = &["ID", "STATUS", "TOTAL", "PLACED"];

// =============================================================================
// Commands
// =============================================================================

pub async fn run(db: &Database, command: OrderCommand) -> CliResult<Output> {
    match command {
        OrderCommand::Place { customer, lines } => place(db, &customer, &lines).await,
        OrderCommand::Pay {
            order_id,
            amount,
            method,
        } => pay(db, &order_id, amount, &method).await,
        OrderCommand::Cancel { order_id, yes } => cancel(db, &order_id, yes).await,
        OrderCommand::Show { order_id } => show(db, &order_id).await,
        OrderCommand::List { customer } => list(db, &customer).await,
    }
}

async fn place(db: &Database, customer_id: &str, lines: &[LineRequest]) -> CliResult<Output> {
    let order = db.fulfillment().place_order(customer_id, lines).await?;
    let details = db.fulfillment().get_order(&order.id).await?;
    let dto = OrderDetailsDto::from(details);

    let text = format!(
        "Placed order {} for {} (pending payment)\n\n{}",
        dto.order.id,
        dto.order.total,
        render_lines(&dto.lines)
    );
    Output::new(&dto, text)
}

async fn pay(db: &Database, order_id: &str, amount: Money, method: &str) -> CliResult<Output> {
    let order = db.fulfillment().record_payment(order_id, amount, method).await?;
    let dto = OrderDto::from(order);

    let text = format!("Order {} paid: {} by {}", dto.id, dto.total, method.trim());
    Output::new(&dto, text)
}

async fn cancel(db: &Database, order_id: &str, confirmed: bool) -> CliResult<Output> {
    let outcome = db.fulfillment().cancel_order(order_id, confirmed).await?;

    let text = match &outcome {
        CancelOutcome::Cancelled(order) => {
            format!("Order {} cancelled, stock restored", order.id)
        }
        CancelOutcome::Aborted { order_id } => format!(
            "Order {} already has a payment attached. Nothing changed.\n\
             Re-run with --yes to cancel it anyway (the payment is kept).",
            order_id
        ),
    };
    Output::new(&outcome, text)
}

async fn show(db: &Database, order_id: &str) -> CliResult<Output> {
    let dto = OrderDetailsDto::from(db.fulfillment().get_order(order_id).await?);

    let mut text = format!(
        "Order    {}\nCustomer {}\nStatus   {}\nPlaced   {}\n",
        dto.order.id,
        dto.order.customer_id,
        dto.order.status,
        dto.order.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    if let Some(paid_at) = dto.order.paid_at {
        text.push_str(&format!("Paid     {}\n", paid_at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if let Some(cancelled_at) = dto.order.cancelled_at {
        text.push_str(&format!(
            "Cancelled {}\n",
            cancelled_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    text.push('\n');
    text.push_str(&render_lines(&dto.lines));
    text.push_str(&format!("\n\nTotal    {}", dto.order.total));
    if let Some(payment) = &dto.payment {
        text.push_str(&format!("\nPayment  {} ({})", payment.amount, payment.method));
    }

    Output::new(&dto, text)
}

async fn list(db: &Database, customer_id: &str) -> CliResult<Output> {
    let orders: Vec<OrderDto> = db
        .fulfillment()
        .list_orders_for_customer(customer_id)
        .await?
        .into_iter()
        .map(OrderDto::from)
        .collect();

    let text = if orders.is_empty() {
        "No orders".to_string()
    } else {
        table(ORDER_HEADERS, &order_rows(&orders))
    };
    Output::new(&orders, text)
}

fn render_lines(lines: &[OrderLineDto]) -> String {
    let rows: Vec<Vec<String>> = lines
        .iter()
        .map(|l| {
            vec![
                l.name.clone(),
                l.quantity.to_string(),
                l.unit_price.clone(),
                l.line_total.clone(),
            ]
        })
        .collect();
    table(&["ITEM", "QTY", "PRICE", "AMOUNT"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emporium_core::{Customer, Product};
    use emporium_db::DbConfig;

    async fn setup() -> (Database, Customer, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = Customer::new("Ada", None, None).unwrap();
        db.customers().insert(&customer).await.unwrap();
        let pen = Product::new("Pen", "Stationery", Money::from_cents(1000), 5).unwrap();
        db.products().insert(&pen).await.unwrap();
        (db, customer, pen)
    }

    #[tokio::test]
    async fn test_place_pay_show() {
        let (db, customer, pen) = setup().await;

        let placed = place(&db, &customer.id, &[LineRequest::new(&pen.id, 3)])
            .await
            .unwrap();
        assert!(placed.render(false).contains("$30.00"));

        let order_id = db.orders().list_for_customer(&customer.id).await.unwrap()[0]
            .id
            .clone();

        let err = pay(&db, &order_id, Money::from_cents(2999), "cash").await.unwrap_err();
        assert_eq!(err.exit_code(), 4);

        pay(&db, &order_id, Money::from_cents(3000), "cash").await.unwrap();

        let shown = show(&db, &order_id).await.unwrap();
        let text = shown.render(false);
        assert!(text.contains("Status   paid"));
        assert!(text.contains("Payment  $30.00 (cash)"));

        let json = shown.render(true);
        assert!(json.contains("\"status\": \"paid\""));
    }

    #[tokio::test]
    async fn test_cancel_and_list() {
        let (db, customer, pen) = setup().await;
        place(&db, &customer.id, &[LineRequest::new(&pen.id, 2)])
            .await
            .unwrap();
        let order_id = db.orders().list_for_customer(&customer.id).await.unwrap()[0]
            .id
            .clone();

        let cancelled = cancel(&db, &order_id, false).await.unwrap();
        assert!(cancelled.render(true).contains("\"outcome\": \"cancelled\""));

        let listing = list(&db, &customer.id).await.unwrap().render(false);
        assert!(listing.contains("cancelled"));

        let err = list(&db, "nobody").await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
