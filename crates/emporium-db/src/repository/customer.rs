//! # Customer Repository
//!
//! Database operations for customers.
//!
//! Customers are created and edited here. They are removed only through
//! account deletion (`Fulfillment::delete_account`), which also removes
//! their orders, order lines and payments in one transaction.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use emporium_core::validation::validate_customer_name;
use emporium_core::{CoreError, Customer};

/// Loads one customer by id.
pub(crate) async fn fetch_customer<'e, E>(executor: E, id: &str) -> DbResult<Option<Customer>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, phone, email, created_at
        FROM customers
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(customer)
}

/// Deletes the customer row. Orders must already be gone.
pub(crate) async fn delete_customer<'e, E>(executor: E, id: &str) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        fetch_customer(&self.pool, id).await
    }

    /// Lists all customers sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, created_at
            FROM customers
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Updates name and contact details.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Customer doesn't exist
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");
        validate_customer_name(&customer.name).map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                email = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }
}
