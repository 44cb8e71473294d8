//! # Inventory Movement Repository
//!
//! Database operations for the append-only movement log.
//!
//! Movements are inserted in the same transaction that touches
//! `products.current_stock`, which is why [`insert`] takes a connection
//! rather than the pool. The log is never updated except for the free-text
//! reason of adjustment rows, and never deleted except when reversing an
//! adjustment (the reversal itself is recorded as a new adjustment).
//!
//! [`insert`]: MovementRepository::insert

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use panaderia_core::InventoryMovement;

/// Repository for inventory movement operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Inserts a movement row inside an open transaction.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        movement: &InventoryMovement,
    ) -> DbResult<()> {
        debug!(
            id = %movement.id,
            product_id = %movement.product_id,
            movement_type = movement.movement_type.as_str(),
            quantity = movement.quantity,
            "Recording movement"
        );

        sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                id, product_id, movement_type, quantity, stock_delta,
                reason, reference_id, actor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.stock_delta)
        .bind(&movement.reason)
        .bind(&movement.reference_id)
        .bind(&movement.actor)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a movement by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryMovement>> {
        let movement = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, stock_delta,
                   reason, reference_id, actor, created_at
            FROM inventory_movements
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movement)
    }

    /// Lists movements for a product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: i64,
    ) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, stock_delta,
                   reason, reference_id, actor, created_at
            FROM inventory_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists movements linked to a reference (e.g. all movements a sale
    /// produced), oldest first.
    pub async fn list_for_reference(
        &self,
        reference_id: &str,
    ) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, stock_delta,
                   reason, reference_id, actor, created_at
            FROM inventory_movements
            WHERE reference_id = ?1
            ORDER BY created_at ASC
            "#,
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists the most recent movements across all products.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, stock_delta,
                   reason, reference_id, actor, created_at
            FROM inventory_movements
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Updates the free-text reason of a movement. The engine layer has
    /// already checked the row is an adjustment; the WHERE clause enforces
    /// it again so a racing type check cannot slip through.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update_reason(&self, id: &str, reason: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_movements
            SET reason = ?2
            WHERE id = ?1 AND movement_type = 'adjustment'
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a movement row inside an open transaction. Only used by
    /// adjustment reversal, paired with the compensating stock write.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM inventory_movements WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
