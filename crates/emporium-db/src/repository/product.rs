//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Catalog CRUD (administrative, used by the CLI and the seed binary)
//! - Guarded stock adjustment, shared with the unit of work
//!
//! ## Guarded Stock Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ Absolute update (lost updates between concurrent writers)          │
//! │     UPDATE products SET stock = 7 WHERE id = ?                         │
//! │                                                                         │
//! │  ✅ Delta update guarded by the floor and the ceiling                  │
//! │     UPDATE products SET stock = stock + ?delta                         │
//! │     WHERE id = ? AND stock + ?delta BETWEEN 0 AND MAX_STOCK            │
//! │     RETURNING stock                                                    │
//! │                                                                         │
//! │  No row returned → product missing, not enough stock, or the new      │
//! │  level would pass MAX_STOCK. The schema CHECK backs this up.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use emporium_core::validation::{
    validate_category, validate_price_cents, validate_product_name, validate_restock_quantity,
    validate_stock,
};
use emporium_core::{CoreError, Product, ValidationError, MAX_STOCK};

// =============================================================================
// Executor-Generic Helpers
// =============================================================================
// These run on either the pool or an open transaction (`&mut *tx`).

/// Loads one product by id.
pub(crate) async fn fetch_product<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, category, price_cents, stock, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// Adds `delta` to a product's stock unless the result would leave
/// `0..=MAX_STOCK`.
///
/// ## Returns
/// * `Ok(Some(stock))` - New stock level
/// * `Ok(None)` - Product missing, or the new level is out of range
/// * `Err(DbError::Domain(Validation))` - `delta` itself exceeds `MAX_STOCK`
pub(crate) async fn adjust_stock<'e, E>(
    executor: E,
    id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %id, delta = %delta, "Adjusting stock");

    // stock and |delta| both stay within MAX_STOCK, so the sum never
    // reaches SQLite's integer overflow
    if delta.unsigned_abs() > MAX_STOCK.unsigned_abs() {
        return Err(CoreError::from(stock_out_of_range()).into());
    }

    let stock = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE products
        SET stock = stock + ?2,
            updated_at = ?3
        WHERE id = ?1 AND stock + ?2 BETWEEN 0 AND ?4
        RETURNING stock
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .bind(MAX_STOCK)
    .fetch_optional(executor)
    .await?;

    Ok(stock)
}

/// The error reported when a stock level would pass `MAX_STOCK`.
pub(crate) fn stock_out_of_range() -> ValidationError {
    ValidationError::OutOfRange {
        field: "stock".to_string(),
        min: 0,
        max: MAX_STOCK,
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.insert(&Product::new("Pen", "Stationery", price, 10)?).await?;
/// let restocked = repo.restock(&product.id, 5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// Runs the same field checks as [`Product::new`], so a struct built by
    /// hand is held to the same rules.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::Domain(Validation))` - A field breaks a catalog rule
    /// * `Err(DbError::UniqueViolation)` - Id already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_category(&product.category).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;
        validate_stock(product.stock).map_err(CoreError::from)?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, category, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        fetch_product(&self.pool, id).await
    }

    /// Lists the whole catalog sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_cents, stock, created_at, updated_at
            FROM products
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Updates name, category and price.
    ///
    /// Stock is left alone: it only moves through [`Self::restock`] and the
    /// fulfillment engine. Existing order lines keep their snapshots.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_category(&product.category).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                price_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adds `quantity` units to a product's stock.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product with its new stock level
    /// * `Err(DbError::Domain(Validation))` - `quantity` is not positive, or
    ///   the new level would pass `MAX_STOCK`. Nothing is written.
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<Product> {
        validate_restock_quantity(quantity).map_err(CoreError::from)?;

        let updated = adjust_stock(&self.pool, id, quantity, Utc::now()).await?;

        let product = fetch_product(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if updated.is_none() {
            return Err(CoreError::from(stock_out_of_range()).into());
        }

        Ok(product)
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Order lines still reference it
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts catalog entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
