//! # Customer Commands
//!
//! Customer registration, listing, and the customer summary (purchase
//! history plus lifetime spend).

use serde::Serialize;
use tracing::info;

use super::order::{order_rows, OrderDto, ORDER_HEADERS};
use crate::args::CustomerCommand;
use crate::error::{CliError, CliResult};
use crate::output::{table, Output};
use emporium_core::Customer;
use emporium_db::Database;

/// Customer as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDto {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<Customer> for CustomerDto {
    fn from(c: Customer) -> Self {
        CustomerDto {
            id: c.id,
            name: c.name,
            phone: c.phone,
            email: c.email,
        }
    }
}

/// `customer show` result.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummaryDto {
    #[serde(flatten)]
    pub customer: CustomerDto,
    pub lifetime_spend: String,
    pub lifetime_spend_cents: i64,
    pub orders: Vec<OrderDto>,
}

pub async fn run(db: &Database, command: CustomerCommand) -> CliResult<Output> {
    match command {
        CustomerCommand::Add { name, phone, email } => {
            add(db, &name, phone.as_deref(), email.as_deref()).await
        }
        CustomerCommand::List => list(db).await,
        CustomerCommand::Show { customer_id } => show(db, &customer_id).await,
    }
}

async fn add(db: &Database, name: &str, phone: Option<&str>, email: Option<&str>) -> CliResult<Output> {
    let customer = Customer::new(name, phone, email)?;
    let customer = db.customers().insert(&customer).await?;
    info!(id = %customer.id, "Customer added");

    let dto = CustomerDto::from(customer);
    let text = format!("Added customer {}\n{}", dto.name, dto.id);
    Output::new(&dto, text)
}

async fn list(db: &Database) -> CliResult<Output> {
    let customers: Vec<CustomerDto> = db
        .customers()
        .list()
        .await?
        .into_iter()
        .map(CustomerDto::from)
        .collect();

    let text = if customers.is_empty() {
        "No customers".to_string()
    } else {
        let rows: Vec<Vec<String>> = customers
            .iter()
            .map(|c| {
                vec![
                    c.id.clone(),
                    c.name.clone(),
                    c.phone.clone().unwrap_or_default(),
                    c.email.clone().unwrap_or_default(),
                ]
            })
            .collect();
        table(&["ID", "NAME", "PHONE", "EMAIL"], &rows)
    };

    Output::new(&customers, text)
}

async fn show(db: &Database, customer_id: &str) -> CliResult<Output> {
    let customer = db
        .customers()
        .get_by_id(customer_id)
        .await?
        .ok_or_else(|| CliError::not_found("Customer", customer_id))?;

    let engine = db.fulfillment();
    let orders: Vec<OrderDto> = engine
        .list_orders_for_customer(customer_id)
        .await?
        .into_iter()
        .map(OrderDto::from)
        .collect();
    let spend = engine.lifetime_spend(customer_id).await?;

    let summary = CustomerSummaryDto {
        customer: customer.into(),
        lifetime_spend: spend.to_string(),
        lifetime_spend_cents: spend.cents(),
        orders,
    };

    let mut text = format!(
        "{}\n{}\nLifetime spend: {}\n",
        summary.customer.name, summary.customer.id, summary.lifetime_spend
    );
    if let Some(phone) = &summary.customer.phone {
        text.push_str(&format!("Phone: {phone}\n"));
    }
    if let Some(email) = &summary.customer.email {
        text.push_str(&format!("Email: {email}\n"));
    }
    text.push('\n');
    if summary.orders.is_empty() {
        text.push_str("No orders");
    } else {
        text.push_str(&table(ORDER_HEADERS, &order_rows(&summary.orders)));
    }

    Output::new(&summary, text)
}
