//! # Product Repository
//!
//! Database operations for the product catalog, including the two stock
//! primitives the inventory ledger builds on.
//!
//! ## Stock Write Discipline
//! `products.current_stock` is only ever written by [`apply_stock_delta`]
//! (guarded, relative) and [`set_stock`] (absolute, adjustment path). Both
//! take a `&mut SqliteConnection` because they are always part of a larger
//! transaction that also records a movement row.
//!
//! [`apply_stock_delta`]: ProductRepository::apply_stock_delta
//! [`set_stock`]: ProductRepository::set_stock

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use panaderia_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads (outside transactions)
    // =========================================================================

    /// Gets a product by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, description, price_cents, cost_cents,
                   current_stock, min_stock, category_id, status,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, description, price_cents, cost_cents,
                   current_stock, min_stock, category_id, status,
                   created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products at or below their low-stock threshold, most
    /// depleted first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, description, price_cents, cost_cents,
                   current_stock, min_stock, category_id, status,
                   created_at, updated_at
            FROM products
            WHERE status = 'active' AND current_stock <= min_stock
            ORDER BY (min_stock - current_stock) DESC, code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product (seed data and tests).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, price_cents, cost_cents,
                current_stock, min_stock, category_id, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(&product.category_id)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Transactional reads / writes
    // =========================================================================

    /// Reads a product inside an open transaction, so later writes in the
    /// same transaction see a consistent snapshot.
    pub async fn get_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, description, price_cents, cost_cents,
                   current_stock, min_stock, category_id, status,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Applies a signed stock delta, guarded so stock can never go negative.
    ///
    /// The guard is part of the UPDATE itself, so two concurrent debits
    /// cannot both pass a stale pre-check:
    ///
    /// ```sql
    /// UPDATE products SET current_stock = current_stock + ?delta
    /// WHERE id = ? AND current_stock + ?delta >= 0
    /// ```
    ///
    /// Returns `true` if the row was updated, `false` if the guard refused
    /// (insufficient stock, or unknown id). The caller decides which and
    /// rolls back the enclosing transaction.
    pub async fn apply_stock_delta(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        delta: i64,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET current_stock = current_stock + ?2, updated_at = ?3
            WHERE id = ?1 AND current_stock + ?2 >= 0
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let applied = result.rows_affected() > 0;
        debug!(product_id, delta, applied, "Stock delta");
        Ok(applied)
    }

    /// Sets stock to an absolute value (adjustment path). The caller has
    /// already validated `new_stock >= 0` and computed the diff for the
    /// movement record.
    pub async fn set_stock(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        new_stock: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE products
            SET current_stock = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(new_stock)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
