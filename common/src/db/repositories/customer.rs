// Customer repository implementation

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Customer, CustomerUpdate, NewCustomer};
use tracing::instrument;

/// Repository for customer-related database operations
pub struct CustomerRepository {
    pool: DbPool,
}

impl CustomerRepository {
    /// Create a new CustomerRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List active customers ordered by name
    #[instrument(skip(self))]
    pub async fn find_all_active(&self) -> Result<Vec<Customer>, DatabaseError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, name, contact_email, contact_phone, address, notes,
                is_active, created_at, updated_at
            FROM customers
            WHERE is_active = TRUE
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool.pool())
        .await?;

        Ok(customers)
    }

    /// Find a customer by ID
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Customer>, DatabaseError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, name, contact_email, contact_phone, address, notes,
                is_active, created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(customer)
    }

    /// Create a new customer
    #[instrument(skip(self, customer))]
    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer, DatabaseError> {
        let created = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, contact_email, contact_phone, address, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING
                id, name, contact_email, contact_phone, address, notes,
                is_active, created_at, updated_at
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.contact_email)
        .bind(&customer.contact_phone)
        .bind(&customer.address)
        .bind(&customer.notes)
        .fetch_one(self.pool.pool())
        .await?;

        tracing::info!(customer_id = created.id, customer_name = %created.name, "Customer created");
        Ok(created)
    }

    /// Apply a partial update. Name and the active flag keep their current
    /// value when absent; the detail fields are replaced outright.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: i64,
        update: &CustomerUpdate,
    ) -> Result<Customer, DatabaseError> {
        let updated = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                contact_email = $3,
                contact_phone = $4,
                address = $5,
                notes = $6,
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, name, contact_email, contact_phone, address, notes,
                is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.contact_email)
        .bind(&update.contact_phone)
        .bind(&update.address)
        .bind(&update.notes)
        .bind(update.is_active)
        .fetch_optional(self.pool.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Customer not found: {}", id)))?;

        tracing::info!(customer_id = id, "Customer updated");
        Ok(updated)
    }

    /// Count all customers
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(self.pool.pool())
            .await?;

        Ok(count)
    }
}
