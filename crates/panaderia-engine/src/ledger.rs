//! # Inventory Ledger
//!
//! Every change to `products.current_stock` flows through here, paired with
//! an `inventory_movements` row in the same transaction. Two invariants
//! hold at every commit:
//!
//! 1. Stock is never negative (guarded UPDATE, not a read-then-write).
//! 2. Stock equals initial stock plus the sum of recorded `stock_delta`s
//!    (conservation: no silent writes outside the log).
//!
//! ## Movement Paths
//! ```text
//! record_movement()   entry/exit/production/waste, relative delta
//! set_stock()         adjustment, absolute target, delta = new - old
//! bulk_adjust()       many set-stocks, one outer transaction + savepoints
//! reverse_adjustment() delete an erroneous adjustment, apply -stock_delta
//! ```

use chrono::Utc;
use sqlx::Acquire;
use tracing::{debug, info, warn};
use uuid::Uuid;

use panaderia_core::validation::{validate_new_stock, validate_quantity, validate_required};
use panaderia_core::{CoreError, InventoryMovement, MovementType, Product, ValidationError};
use panaderia_db::Database;

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Inputs and Outcomes
// =============================================================================

/// Input for a relative movement (entry, exit, production, waste).
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: String,
    pub movement_type: MovementType,
    /// Positive magnitude; direction comes from the type.
    pub quantity: i64,
    pub reason: String,
    /// Originating sale, when the sales engine is the caller.
    pub reference_id: Option<String>,
}

/// One item of a bulk adjustment.
#[derive(Debug, Clone)]
pub struct BulkAdjustItem {
    pub product_id: String,
    pub new_stock: i64,
    pub reason: String,
}

/// A per-item failure inside a bulk adjustment.
#[derive(Debug)]
pub struct BulkAdjustFailure {
    pub product_id: String,
    pub error: EngineError,
}

/// Result of a bulk adjustment: which items landed, which did not, and
/// whether anything was committed at all.
#[derive(Debug)]
pub struct BulkAdjustOutcome {
    pub applied: Vec<StockAdjustment>,
    pub failed: Vec<BulkAdjustFailure>,
    /// False when every item failed and the whole batch was rolled back.
    pub committed: bool,
}

/// What a set-stock operation did: the before/after pair and the movement
/// that recorded it.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub movement_id: String,
    pub product_id: String,
    pub old_stock: i64,
    pub new_stock: i64,
    pub diff: i64,
}

// =============================================================================
// Ledger
// =============================================================================

/// The inventory ledger service.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
}

impl InventoryLedger {
    /// Creates a ledger over the given database.
    pub fn new(db: Database) -> Self {
        InventoryLedger { db }
    }

    // =========================================================================
    // Relative movements
    // =========================================================================

    /// Records a relative movement in its own transaction.
    ///
    /// Adjustments are refused here: an absolute stock correction must go
    /// through [`set_stock`](Self::set_stock) so its delta is derived from
    /// the actual old value, never asserted by the caller.
    pub async fn record_movement(
        &self,
        new: NewMovement,
        actor: &str,
    ) -> EngineResult<InventoryMovement> {
        let mut tx = self.db.begin().await?;
        let movement = self.record_movement_in(&mut tx, new, actor).await?;
        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;
        Ok(movement)
    }

    /// Records a relative movement inside a caller-owned transaction. The
    /// sales engine uses this to bundle exit movements with the sale insert.
    pub async fn record_movement_in(
        &self,
        conn: &mut sqlx::SqliteConnection,
        new: NewMovement,
        actor: &str,
    ) -> EngineResult<InventoryMovement> {
        validate_quantity(new.quantity).map_err(CoreError::from)?;
        validate_required("reason", &new.reason).map_err(CoreError::from)?;

        let delta = new
            .movement_type
            .signed_delta(new.quantity)
            .ok_or_else(|| {
                CoreError::from(ValidationError::NotAllowed {
                    field: "movement_type".to_string(),
                    allowed: vec![
                        "entry".into(),
                        "exit".into(),
                        "production".into(),
                        "waste".into(),
                    ],
                })
            })?;

        let product = self.require_product(conn, &new.product_id).await?;

        let applied = self
            .db
            .products()
            .apply_stock_delta(conn, &product.id, delta)
            .await?;
        if !applied {
            // The guard refused: a debit larger than what is on the shelf.
            warn!(
                product = %product.code,
                available = product.current_stock,
                requested = new.quantity,
                "Movement rejected, insufficient stock"
            );
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.current_stock,
                requested: new.quantity,
            }
            .into());
        }

        let movement = InventoryMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id,
            movement_type: new.movement_type,
            quantity: new.quantity,
            stock_delta: delta,
            reason: new.reason,
            reference_id: new.reference_id,
            actor: actor.to_string(),
            created_at: Utc::now(),
        };
        self.db.movements().insert(conn, &movement).await?;

        debug!(
            movement_id = %movement.id,
            movement_type = movement.movement_type.as_str(),
            delta,
            "Movement recorded"
        );
        Ok(movement)
    }

    // =========================================================================
    // Absolute adjustments
    // =========================================================================

    /// Sets a product's stock to an absolute value, recording the diff as
    /// an adjustment movement.
    ///
    /// Setting stock to its current value is refused
    /// (`CoreError::StockUnchanged`): a zero-delta adjustment row would be
    /// noise in the audit trail.
    pub async fn set_stock(
        &self,
        product_id: &str,
        new_stock: i64,
        reason: &str,
        actor: &str,
    ) -> EngineResult<StockAdjustment> {
        let mut tx = self.db.begin().await?;
        let adjustment = self
            .set_stock_in(&mut tx, product_id, new_stock, reason, actor)
            .await?;
        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

        info!(product_id, new_stock, diff = adjustment.diff, "Stock adjusted");
        Ok(adjustment)
    }

    async fn set_stock_in(
        &self,
        conn: &mut sqlx::SqliteConnection,
        product_id: &str,
        new_stock: i64,
        reason: &str,
        actor: &str,
    ) -> EngineResult<StockAdjustment> {
        validate_new_stock(new_stock).map_err(CoreError::from)?;
        validate_required("reason", reason).map_err(CoreError::from)?;

        let product = self.require_product(conn, product_id).await?;

        let delta = new_stock - product.current_stock;
        if delta == 0 {
            return Err(CoreError::StockUnchanged {
                product_id: product.id,
                stock: new_stock,
            }
            .into());
        }

        self.db.products().set_stock(conn, &product.id, new_stock).await?;

        let movement = InventoryMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            movement_type: MovementType::Adjustment,
            quantity: delta.abs(),
            stock_delta: delta,
            reason: reason.to_string(),
            reference_id: None,
            actor: actor.to_string(),
            created_at: Utc::now(),
        };
        self.db.movements().insert(conn, &movement).await?;

        Ok(StockAdjustment {
            movement_id: movement.id,
            product_id: product.id,
            old_stock: product.current_stock,
            new_stock,
            diff: delta,
        })
    }

    /// Applies many absolute adjustments in one outer transaction, one
    /// savepoint per item.
    ///
    /// A failed item rolls back only its own savepoint; the rest of the
    /// batch proceeds. If every item fails the outer transaction is rolled
    /// back too, and the outcome still carries every per-item error.
    pub async fn bulk_adjust(
        &self,
        items: Vec<BulkAdjustItem>,
        actor: &str,
    ) -> EngineResult<BulkAdjustOutcome> {
        let mut tx = self.db.begin().await?;
        let mut applied = Vec::new();
        let mut failed = Vec::new();

        for item in items {
            let mut savepoint = tx
                .begin()
                .await
                .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

            match self
                .set_stock_in(
                    &mut savepoint,
                    &item.product_id,
                    item.new_stock,
                    &item.reason,
                    actor,
                )
                .await
            {
                Ok(adjustment) => {
                    savepoint
                        .commit()
                        .await
                        .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;
                    applied.push(adjustment);
                }
                Err(error) => {
                    // Savepoint rolls back on drop; outer batch continues.
                    drop(savepoint);
                    failed.push(BulkAdjustFailure {
                        product_id: item.product_id,
                        error,
                    });
                }
            }
        }

        let committed = !applied.is_empty();
        if committed {
            tx.commit()
                .await
                .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;
        } else {
            drop(tx);
        }

        info!(
            applied = applied.len(),
            failed = failed.len(),
            committed,
            "Bulk adjustment finished"
        );
        Ok(BulkAdjustOutcome {
            applied,
            failed,
            committed,
        })
    }

    // =========================================================================
    // Adjustment corrections
    // =========================================================================

    /// Rewrites the free-text reason of an adjustment movement. The rest of
    /// the log is immutable.
    pub async fn update_movement_reason(&self, movement_id: &str, reason: &str) -> EngineResult<()> {
        validate_required("reason", reason).map_err(CoreError::from)?;

        let movement = self
            .db
            .movements()
            .get_by_id(movement_id)
            .await?
            .ok_or_else(|| CoreError::MovementNotFound(movement_id.to_string()))?;

        if movement.movement_type != MovementType::Adjustment {
            return Err(CoreError::NotAnAdjustment {
                movement_id: movement.id,
                movement_type: movement.movement_type.as_str().to_string(),
            }
            .into());
        }

        let updated = self.db.movements().update_reason(movement_id, reason).await?;
        if !updated {
            return Err(CoreError::MovementNotFound(movement_id.to_string()).into());
        }
        Ok(())
    }

    /// Deletes an erroneous adjustment and applies the exact inverse of the
    /// delta it recorded.
    ///
    /// The inverse is `-stock_delta`, taken from the row itself; the guard
    /// still applies, so a reversal that would drive stock negative is
    /// refused.
    pub async fn reverse_adjustment(
        &self,
        movement_id: &str,
        _actor: &str,
    ) -> EngineResult<InventoryMovement> {
        let movement = self
            .db
            .movements()
            .get_by_id(movement_id)
            .await?
            .ok_or_else(|| CoreError::MovementNotFound(movement_id.to_string()))?;

        if movement.movement_type != MovementType::Adjustment {
            return Err(CoreError::NotAnAdjustment {
                movement_id: movement.id,
                movement_type: movement.movement_type.as_str().to_string(),
            }
            .into());
        }

        let mut tx = self.db.begin().await?;

        let product = self.require_product(&mut tx, &movement.product_id).await?;

        let applied = self
            .db
            .products()
            .apply_stock_delta(&mut tx, &product.id, -movement.stock_delta)
            .await?;
        if !applied {
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.current_stock,
                requested: movement.stock_delta,
            }
            .into());
        }

        self.db.movements().delete(&mut tx, &movement.id).await?;

        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

        info!(
            movement_id = %movement.id,
            inverse_delta = -movement.stock_delta,
            "Adjustment reversed"
        );
        Ok(movement)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current stock of a product.
    pub async fn current_stock(&self, product_id: &str) -> EngineResult<i64> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        Ok(product.current_stock)
    }

    /// Active products at or below their low-stock threshold.
    pub async fn list_low_stock(&self) -> EngineResult<Vec<Product>> {
        Ok(self.db.products().list_low_stock().await?)
    }

    /// Movement history for a product, newest first.
    pub async fn movement_history(
        &self,
        product_id: &str,
        limit: i64,
    ) -> EngineResult<Vec<InventoryMovement>> {
        Ok(self.db.movements().list_for_product(product_id, limit).await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn require_product(
        &self,
        conn: &mut sqlx::SqliteConnection,
        product_id: &str,
    ) -> EngineResult<Product> {
        self.db
            .products()
            .get_in(conn, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }
}
