//! # Command-Line Arguments
//!
//! clap derive definitions for every subcommand.
//!
//! ```text
//! emporium [--database PATH] [--json] <COMMAND>
//!
//!   product  add <NAME> --category <C> --price <AMOUNT> [--stock N]
//!            list
//!            restock <PRODUCT_ID> <QUANTITY>
//!   customer add <NAME> [--phone P] [--email E]
//!            list
//!            show <CUSTOMER_ID>
//!   order    place --customer <ID> --line <PRODUCT_ID>:<QTY>...
//!            pay <ORDER_ID> <AMOUNT> [--method M]
//!            cancel <ORDER_ID> [--yes]
//!            show <ORDER_ID>
//!            list --customer <ID>
//!   account  delete <CUSTOMER_ID> --yes
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use emporium_core::{LineRequest, Money};

/// Order fulfillment for a small shop: catalog, customers, orders, payments
#[derive(Parser, Debug)]
#[command(name = "emporium", version)]
#[command(about = "Order fulfillment for a small shop", long_about = None)]
pub struct Cli {
    /// SQLite database file (default: platform data directory)
    #[arg(long, global = true, value_name = "PATH", env = "EMPORIUM_DB_PATH")]
    pub database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the product catalog
    #[command(subcommand)]
    Product(ProductCommand),

    /// Manage customers
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Place, pay, cancel and inspect orders
    #[command(subcommand)]
    Order(OrderCommand),

    /// Customer account lifecycle
    #[command(subcommand)]
    Account(AccountCommand),
}

// =============================================================================
// Product
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// Add a product to the catalog
    Add(ProductAddArgs),

    /// List the catalog
    List,

    /// Add units to a product's stock
    Restock {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,

        #[arg(value_name = "QUANTITY")]
        quantity: i64,
    },
}

#[derive(Args, Debug)]
pub struct ProductAddArgs {
    /// Display name
    pub name: String,

    /// Category (brand, department, ...)
    #[arg(long)]
    pub category: String,

    /// Unit price, e.g. 10.99
    #[arg(long, value_name = "AMOUNT")]
    pub price: Money,

    /// Initial stock
    #[arg(long, default_value_t = 0)]
    pub stock: i64,
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
    /// Register a customer
    Add {
        name: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// List customers
    List,

    /// Show a customer with purchase history and lifetime spend
    Show {
        #[arg(value_name = "CUSTOMER_ID")]
        customer_id: String,
    },
}

// =============================================================================
// Order
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    /// Place an order and reserve its stock
    Place {
        #[arg(long, value_name = "CUSTOMER_ID")]
        customer: String,

        /// Repeatable: --line PRODUCT_ID:QTY
        #[arg(long = "line", value_name = "PRODUCT_ID:QTY", required = true, value_parser = parse_line)]
        lines: Vec<LineRequest>,
    },

    /// Record the exact-amount payment for an order
    Pay {
        #[arg(value_name = "ORDER_ID")]
        order_id: String,

        #[arg(value_name = "AMOUNT")]
        amount: Money,

        #[arg(long, default_value = "cash")]
        method: String,
    },

    /// Cancel a pending order and restore its stock
    Cancel {
        #[arg(value_name = "ORDER_ID")]
        order_id: String,

        /// Confirm cancelling an order that already has a payment attached
        #[arg(long)]
        yes: bool,
    },

    /// Show an order with its lines and payment
    Show {
        #[arg(value_name = "ORDER_ID")]
        order_id: String,
    },

    /// List a customer's orders, newest first
    List {
        #[arg(long, value_name = "CUSTOMER_ID")]
        customer: String,
    },
}

// =============================================================================
// Account
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Delete a customer with all their orders and payments
    Delete {
        #[arg(value_name = "CUSTOMER_ID")]
        customer_id: String,

        /// Required: this cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

/// Parses `PRODUCT_ID:QTY`.
///
/// The split is on the last colon, so ids may contain colons.
fn parse_line(value: &str) -> Result<LineRequest, String> {
    let (product_id, quantity) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected PRODUCT_ID:QTY, got '{value}'"))?;

    if product_id.trim().is_empty() {
        return Err(format!("missing product id in '{value}'"));
    }

    let quantity: i64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity in '{value}'"))?;

    Ok(LineRequest::new(product_id.trim(), quantity))
}

// =============================================================================
// Unit Tests
// =============================================================================
