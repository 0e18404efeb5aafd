//! # Seed Data Generator
//!
//! Populates a database with a demo catalog, customers and a few orders.
//!
//! ## Usage
//! ```bash
//! # Seed ./emporium_dev.db with the full demo catalog
//! cargo run -p emporium-db --bin seed
//!
//! # Fewer products
//! cargo run -p emporium-db --bin seed -- --count 20
//!
//! # Specify database path
//! cargo run -p emporium-db --bin seed -- --db ./data/emporium.db
//! ```
//!
//! ## Generated Data
//! - Products across Stationery, Books, Kitchen and Garden, with
//!   deterministic prices ($1.49 - $39.99) and stock (0 - 40)
//! - Demo customers with optional contact details
//! - One paid and one pending order for the first customer

use std::env;

use emporium_core::{Customer, LineRequest, Money, Product};
use emporium_db::{Database, DbConfig};

/// Demo catalog: (category, product names)
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Stationery",
        &[
            "Ballpoint Pen",
            "Fountain Pen",
            "Ink Cartridges",
            "Notebook A5",
            "Notebook A4",
            "Sticky Notes",
            "Stapler",
            "Paper Clips",
        ],
    ),
    (
        "Books",
        &[
            "Field Guide to Birds",
            "Pocket Atlas",
            "Cookbook Basics",
            "Crossword Collection",
            "Sketching for Beginners",
        ],
    ),
    (
        "Kitchen",
        &[
            "Tea Towel",
            "Wooden Spoon",
            "Measuring Cups",
            "Enamel Mug",
            "Bread Knife",
            "Spice Jar Set",
        ],
    ),
    (
        "Garden",
        &[
            "Seed Packet Basil",
            "Seed Packet Tomato",
            "Hand Trowel",
            "Pruning Shears",
            "Watering Can",
        ],
    ),
];

/// Demo customers: (name, phone, email)
const CUSTOMERS: &[(&str, Option<&str>, Option<&str>)] = &[
    ("Ada Lovelace", Some("555-0101"), Some("ada@example.com")),
    ("Grace Hopper", None, Some("grace@example.com")),
    ("Alan Turing", Some("555-0103"), None),
    ("Katherine Johnson", None, None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./emporium_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Emporium Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: whole catalog)");
                println!("  -d, --db <PATH>    Database file path (default: ./emporium_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Emporium Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    let mut products = Vec::new();
    let mut seed = 0usize;
    'catalog: for (category, names) in CATALOG {
        for name in names.iter() {
            if products.len() >= count {
                break 'catalog;
            }

            let product = generate_product(category, name, seed)?;
            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            products.push(product);
            seed += 1;
        }
    }
    println!("✓ Generated {} products", products.len());

    // Customers
    let mut customers = Vec::new();
    for (name, phone, email) in CUSTOMERS {
        let customer = Customer::new(name, *phone, *email)?;
        db.customers().insert(&customer).await?;
        customers.push(customer);
    }
    println!("✓ Generated {} customers", customers.len());

    // A paid and a pending order for the first customer
    let in_stock: Vec<&Product> = products.iter().filter(|p| p.stock >= 2).take(3).collect();
    if let (Some(customer), [first, second, third]) = (customers.first(), in_stock.as_slice()) {
        let engine = db.fulfillment();

        let paid = engine
            .place_order(
                &customer.id,
                &[LineRequest::new(&first.id, 2), LineRequest::new(&second.id, 1)],
            )
            .await?;
        engine.record_payment(&paid.id, paid.total(), "cash").await?;

        let pending = engine
            .place_order(&customer.id, &[LineRequest::new(&third.id, 1)])
            .await?;

        println!("✓ Orders for {}:", customer.name);
        println!("  {} paid     {}", paid.id, paid.total());
        println!("  {} pending  {}", pending.id, pending.total());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with a deterministic price and stock level.
fn generate_product(category: &str, name: &str, seed: usize) -> Result<Product, Box<dyn std::error::Error>> {
    // $1.49 - $39.99
    let price_cents = 149 + ((seed * 379) % 3851) as i64;

    // 0 - 40, with every seventh product out of stock
    let stock = if seed % 7 == 6 { 0 } else { ((seed * 13) % 41) as i64 };

    Ok(Product::new(name, category, Money::from_cents(price_cents), stock)?)
}
