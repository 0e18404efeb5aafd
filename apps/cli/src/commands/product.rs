//! # Product Commands
//!
//! Catalog administration: add, list, restock.

use serde::Serialize;
use tracing::info;

use crate::args::{ProductAddArgs, ProductCommand};
use crate::error::CliResult;
use crate::output::{table, Output};
use emporium_core::Product;
use emporium_db::Database;

/// Product as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub price_cents: i64,
    pub stock: i64,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            price: p.price().to_string(),
            id: p.id,
            name: p.name,
            category: p.category,
            price_cents: p.price_cents,
            stock: p.stock,
        }
    }
}

pub async fn run(db: &Database, command: ProductCommand) -> CliResult<Output> {
    match command {
        ProductCommand::Add(args) => add(db, args).await,
        ProductCommand::List => list(db).await,
        ProductCommand::Restock {
            product_id,
            quantity,
        } => restock(db, &product_id, quantity).await,
    }
}

async fn add(db: &Database, args: ProductAddArgs) -> CliResult<Output> {
    let product = Product::new(&args.name, &args.category, args.price, args.stock)?;
    let product = db.products().insert(&product).await?;
    info!(id = %product.id, name = %product.name, "Product added");

    let dto = ProductDto::from(product);
    let text = format!(
        "Added product {} ({}, {} in stock)\n{}",
        dto.name, dto.price, dto.stock, dto.id
    );
    Output::new(&dto, text)
}

async fn list(db: &Database) -> CliResult<Output> {
    let products: Vec<ProductDto> = db
        .products()
        .list()
        .await?
        .into_iter()
        .map(ProductDto::from)
        .collect();

    let text = if products.is_empty() {
        "No products".to_string()
    } else {
        let rows: Vec<Vec<String>> = products
            .iter()
            .map(|p| {
                vec![
                    p.id.clone(),
                    p.name.clone(),
                    p.category.clone(),
                    p.price.clone(),
                    p.stock.to_string(),
                ]
            })
            .collect();
        table(&["ID", "NAME", "CATEGORY", "PRICE", "STOCK"], &rows)
    };

    Output::new(&products, text)
}

async fn restock(db: &Database, product_id: &str, quantity: i64) -> CliResult<Output> {
    let product = db.products().restock(product_id, quantity).await?;
    info!(id = %product.id, added = quantity, stock = product.stock, "Product restocked");

    let dto = ProductDto::from(product);
    let text = format!("{} now has {} in stock", dto.name, dto.stock);
    Output::new(&dto, text)
}
