// Product repository implementation

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{NewProduct, Product};
use tracing::instrument;

/// Repository for product-related database operations
pub struct ProductRepository {
    pool: DbPool,
}

impl ProductRepository {
    /// Create a new ProductRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all products ordered by vendor then name
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Product>, DatabaseError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, vendor, sku, description, default_term_months, notes,
                created_at, updated_at
            FROM products
            ORDER BY vendor, name
            "#,
        )
        .fetch_all(self.pool.pool())
        .await?;

        Ok(products)
    }

    /// Find a product by ID
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Product>, DatabaseError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, vendor, sku, description, default_term_months, notes,
                created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(product)
    }

    /// Create a new product
    #[instrument(skip(self, product))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, DatabaseError> {
        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, vendor, sku, description, default_term_months, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                id, name, vendor, sku, description, default_term_months, notes,
                created_at, updated_at
            "#,
        )
        .bind(&product.name)
        .bind(&product.vendor)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.default_term_months)
        .bind(&product.notes)
        .fetch_one(self.pool.pool())
        .await?;

        tracing::info!(product_id = created.id, product_name = %created.name, "Product created");
        Ok(created)
    }

    /// Count all products
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool.pool())
            .await?;

        Ok(count)
    }
}
