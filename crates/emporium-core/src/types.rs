//! # Domain Types
//!
//! Core domain types used throughout Emporium.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │      Order      │   │    Payment      │       │
//! │  │  ─────────────  │ 1 │  ─────────────  │ 1 │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  id (UUID)      │◄──│  order_id (FK)  │       │
//! │  │  name           │ * │  customer_id    │0..1  amount_cents  │       │
//! │  │  phone, email   │   │  status         │   │  method         │       │
//! │  └─────────────────┘   │  total_cents    │   └─────────────────┘       │
//! │                        └────────┬────────┘                              │
//! │                                 │ owns 1..*                             │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │    Product      │◄──│   OrderLine     │   │  OrderStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price_cents    │   │  product_id     │   │  Pending        │       │
//! │  │  stock (>= 0)   │   │  quantity (> 0) │   │  Paid      (T)  │       │
//! │  └─────────────────┘   │  unit_price     │   │  Cancelled (T)  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::money::Money;
use crate::validation::{
    validate_category, validate_customer_name, validate_price_cents, validate_product_name,
    validate_stock,
};

/// Generates a new entity id (UUID v4 string).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Free-form category (brand, department, ...).
    pub category: String,

    /// Unit price in cents. Never negative.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a validated product with a fresh id.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::{Money, Product};
    ///
    /// let pen = Product::new("Fountain Pen", "Stationery", Money::from_cents(1000), 5).unwrap();
    /// assert_eq!(pen.stock, 5);
    /// assert!(Product::new("", "Stationery", Money::zero(), 0).is_err());
    /// ```
    pub fn new(name: &str, category: &str, price: Money, stock: i64) -> CoreResult<Self> {
        validate_product_name(name)?;
        validate_category(category)?;
        validate_price_cents(price.cents())?;
        validate_stock(stock)?;

        let now = Utc::now();
        Ok(Product {
            id: generate_id(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            price_cents: price.cents(),
            stock,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who places orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Builds a validated customer with a fresh id. Blank contact fields
    /// are stored as `None`.
    pub fn new(name: &str, phone: Option<&str>, email: Option<&str>) -> CoreResult<Self> {
        validate_customer_name(name)?;

        let contact = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Customer {
            id: generate_id(),
            name: name.trim().to_string(),
            phone: contact(phone),
            email: contact(email),
            created_at: Utc::now(),
        })
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order.
///
/// ```text
///            record_payment
///   Pending ───────────────► Paid       (terminal)
///      │
///      │ cancel_order
///      └───────────────────► Cancelled  (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Stock reserved, awaiting payment or cancellation.
    Pending,
    /// Exact-amount payment recorded.
    Paid,
    /// Stock restored before payment.
    Cancelled,
}

impl OrderStatus {
    /// Lowercase name, identical to the stored value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Paid and Cancelled admit no further transitions.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (*self, next),
            (OrderStatus::Pending, OrderStatus::Paid) | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order placed by a customer.
///
/// `total_cents` is computed once at placement and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line of an order.
/// Name and unit price are frozen at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of order (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of order (frozen).
    pub unit_price_cents: i64,
    /// Quantity ordered, always positive.
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    /// Position within the order, as requested.
    pub position: i64,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment settling an order. At most one per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    /// Free text ("cash", "card", "pix", ...).
    pub method: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// An order together with its lines and payment, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub payment: Option<Payment>,
}

impl OrderDetails {
    /// Σ line totals. Equals `order.total()` for every persisted order.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));

        for terminal in [OrderStatus::Paid, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_order_status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        assert_eq!(OrderStatus::Paid.to_string(), "paid");
    }

    #[test]
    fn test_product_stock_check() {
        let product = Product::new(" Widget ", "Tools", Money::from_cents(1000), 5).unwrap();
        assert_eq!(product.name, "Widget");
        assert!(product.has_stock_for(5));
        assert!(!product.has_stock_for(6));
        assert_eq!(product.price().cents(), 1000);
    }

    #[test]
    fn test_product_rejects_negative_stock() {
        assert!(Product::new("Widget", "Tools", Money::from_cents(1000), -1).is_err());
        assert!(Product::new("Widget", "", Money::from_cents(1000), 1).is_err());
    }

    #[test]
    fn test_customer_blank_contacts_become_none() {
        let customer = Customer::new("Ana", Some("  "), Some("ana@example.com")).unwrap();
        assert_eq!(customer.phone, None);
        assert_eq!(customer.email.as_deref(), Some("ana@example.com"));
        assert!(Customer::new(" ", None, None).is_err());
    }
}
