//! # Sales Engine
//!
//! The sale/inventory consistency flow. A processed sale and its stock
//! effects are one transaction: the header, every line, and one `exit`
//! movement per line commit together or not at all.
//!
//! ## Two Creation Paths
//! - [`process_sale`](SalesEngine::process_sale) — the full flow: validate,
//!   pre-flight stock check per line, then the atomic write. The sale lands
//!   as `completed`.
//! - [`create_sale`](SalesEngine::create_sale) — header only, no lines, no
//!   inventory effect. Kept for callers that build sales incrementally.
//!
//! ## Double-Check on Stock
//! The pre-flight read gives a friendly early error; the conditional UPDATE
//! inside the transaction is the real guard. Two lines of the same product
//! that individually pass pre-flight but jointly overdraw are caught by the
//! second movement's guard, rolling back the whole sale.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use panaderia_core::validation::{
    validate_quantity, validate_sale_totals, validate_unit_price,
};
use panaderia_core::{
    CoreError, Money, MovementType, PaymentMethod, Sale, SaleLine, SaleStatus, ValidationError,
};
use panaderia_db::{Database, SaleHeaderPatch, SaleListFilter};

use crate::error::EngineResult;
use crate::ledger::{InventoryLedger, NewMovement};

/// Movement reason recorded for each line of a processed sale.
const REASON_SALE: &str = "Venta";
/// Movement reason recorded when a completed sale is cancelled.
const REASON_CANCELLATION: &str = "Cancelación de venta";

// =============================================================================
// Inputs and DTOs
// =============================================================================

/// Input for a sale header.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub employee_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Caller-supplied tax amount in cents (the tax regime lives outside
    /// this core).
    pub tax_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    /// Explicit invoice number; generated when absent.
    pub invoice_number: Option<String>,
}

/// Input for one sale line.
#[derive(Debug, Clone)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
    /// Explicit unit price in cents; the product's current price when
    /// absent. Snapshotted onto the line either way.
    pub unit_price_cents: Option<i64>,
}

/// A rendered receipt for a processed sale.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Receipt {
    pub invoice_number: String,
    pub employee_id: String,
    pub customer_name: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub payment_method: PaymentMethod,
    pub issued_at: chrono::DateTime<Utc>,
}

/// One line of a receipt, with display-formatted amounts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReceiptLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub line_subtotal: String,
}

// =============================================================================
// Engine
// =============================================================================

/// The sales engine service.
#[derive(Debug, Clone)]
pub struct SalesEngine {
    db: Database,
    ledger: InventoryLedger,
}

impl SalesEngine {
    /// Creates a sales engine over the given database.
    pub fn new(db: Database) -> Self {
        let ledger = InventoryLedger::new(db.clone());
        SalesEngine { db, ledger }
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Processes a complete sale: header, lines and one exit movement per
    /// line, all in one transaction. Returns the stored sale and lines.
    pub async fn process_sale(
        &self,
        new: NewSale,
        lines: Vec<NewSaleLine>,
    ) -> EngineResult<(Sale, Vec<SaleLine>)> {
        if lines.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "lines".to_string(),
            })
            .into());
        }
        for line in &lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
        }
        if new.tax_cents < 0 {
            return Err(CoreError::from(ValidationError::MustBeNonNegative {
                field: "tax".to_string(),
            })
            .into());
        }

        let mut tx = self.db.begin().await?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        // Pre-flight pass: resolve products, snapshot prices, compute
        // totals. Friendly errors before anything is written.
        let mut subtotal = Money::zero();
        let mut resolved: Vec<SaleLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = self
                .db
                .products()
                .get_in(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if product.current_stock < line.quantity {
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.current_stock,
                    requested: line.quantity,
                }
                .into());
            }

            let unit_price = line.unit_price_cents.unwrap_or(product.price_cents);
            validate_unit_price(unit_price).map_err(CoreError::from)?;

            let line_subtotal = Money::from_cents(unit_price)
                .checked_mul(line.quantity)
                .ok_or_else(|| {
                    CoreError::from(ValidationError::InvalidFormat {
                        field: "line_subtotal".to_string(),
                        reason: "amount overflow".to_string(),
                    })
                })?;
            subtotal = subtotal.checked_add(line_subtotal).ok_or_else(|| {
                CoreError::from(ValidationError::InvalidFormat {
                    field: "subtotal".to_string(),
                    reason: "amount overflow".to_string(),
                })
            })?;

            resolved.push(SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                quantity: line.quantity,
                unit_price_cents: unit_price,
                line_subtotal_cents: line_subtotal.cents(),
                created_at: now,
            });
        }

        let total = subtotal.cents() + new.tax_cents;
        let invoice_number = new
            .invoice_number
            .clone()
            .unwrap_or_else(|| generate_invoice_number());

        let sale = Sale {
            id: sale_id.clone(),
            invoice_number,
            employee_id: new.employee_id.clone(),
            customer_name: new.customer_name,
            customer_phone: new.customer_phone,
            subtotal_cents: subtotal.cents(),
            tax_cents: new.tax_cents,
            total_cents: total,
            payment_method: new.payment_method,
            status: SaleStatus::Completed,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        self.db.sales().insert_sale(&mut tx, &sale).await?;

        // Write pass: lines plus the guarded stock debits. The guard, not
        // the pre-flight read, is what actually protects stock.
        for line in &resolved {
            self.db.sales().insert_line(&mut tx, line).await?;
            self.ledger
                .record_movement_in(
                    &mut tx,
                    NewMovement {
                        product_id: line.product_id.clone(),
                        movement_type: MovementType::Exit,
                        quantity: line.quantity,
                        reason: REASON_SALE.to_string(),
                        reference_id: Some(sale_id.clone()),
                    },
                    &new.employee_id,
                )
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            invoice = %sale.invoice_number,
            total_cents = sale.total_cents,
            lines = resolved.len(),
            "Sale processed"
        );
        Ok((sale, resolved))
    }

    /// Creates a header-only sale with no lines and no inventory effect.
    /// Defaults to `completed`; pass `SaleStatus::Pending` to leave the
    /// sale open for later editing.
    pub async fn create_sale(
        &self,
        new: NewSale,
        subtotal_cents: i64,
        total_cents: i64,
        status: Option<SaleStatus>,
    ) -> EngineResult<Sale> {
        validate_sale_totals(subtotal_cents, new.tax_cents, total_cents)
            .map_err(CoreError::from)?;

        let status = status.unwrap_or(SaleStatus::Completed);
        if status.is_terminal() {
            return Err(CoreError::from(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["pending".into(), "completed".into()],
            })
            .into());
        }

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            invoice_number: new
                .invoice_number
                .clone()
                .unwrap_or_else(|| generate_invoice_number()),
            employee_id: new.employee_id,
            customer_name: new.customer_name,
            customer_phone: new.customer_phone,
            subtotal_cents,
            tax_cents: new.tax_cents,
            total_cents,
            payment_method: new.payment_method,
            status,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        self.db.sales().insert_sale(&mut tx, &sale).await?;
        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id = %sale.id, invoice = %sale.invoice_number, "Sale created (header only)");
        Ok(sale)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Cancels a sale.
    ///
    /// A sale cancels exactly once: already-cancelled gives
    /// `AlreadyCancelled`, refunded is terminal. When the sale had been
    /// completed, every line gets a compensating `entry` movement in the
    /// same transaction that flips the status, so stock returns exactly to
    /// its pre-sale level.
    pub async fn cancel_sale(&self, sale_id: &str, actor: &str) -> EngineResult<Sale> {
        let mut tx = self.db.begin().await?;

        let sale = self
            .db
            .sales()
            .get_in(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.status == SaleStatus::Cancelled {
            return Err(CoreError::AlreadyCancelled(sale.id).into());
        }
        if !sale.status.can_cancel() {
            return Err(CoreError::InvalidSaleState {
                sale_id: sale.id,
                status: sale.status.as_str().to_string(),
            }
            .into());
        }

        let flipped = self
            .db
            .sales()
            .set_status(
                &mut tx,
                &sale.id,
                &[SaleStatus::Pending, SaleStatus::Completed],
                SaleStatus::Cancelled,
            )
            .await?;
        if !flipped {
            // Raced with another transition since our read.
            warn!(sale_id = %sale.id, "Cancel lost a status race");
            return Err(CoreError::InvalidSaleState {
                sale_id: sale.id,
                status: sale.status.as_str().to_string(),
            }
            .into());
        }

        // Pending sales never debited stock; nothing to restock.
        if sale.status == SaleStatus::Completed {
            let lines = self.db.sales().lines_in(&mut tx, &sale.id).await?;
            for line in &lines {
                self.ledger
                    .record_movement_in(
                        &mut tx,
                        NewMovement {
                            product_id: line.product_id.clone(),
                            movement_type: MovementType::Entry,
                            quantity: line.quantity,
                            reason: REASON_CANCELLATION.to_string(),
                            reference_id: Some(sale.id.clone()),
                        },
                        actor,
                    )
                    .await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id = %sale.id, was = sale.status.as_str(), "Sale cancelled");
        Ok(Sale {
            status: SaleStatus::Cancelled,
            ..sale
        })
    }

    /// Updates the header of a pending sale. Any other status gives
    /// `InvalidSaleState`.
    pub async fn update_sale(
        &self,
        sale_id: &str,
        patch: SaleHeaderPatch,
    ) -> EngineResult<Sale> {
        validate_sale_totals(patch.subtotal_cents, patch.tax_cents, patch.total_cents)
            .map_err(CoreError::from)?;

        let mut tx = self.db.begin().await?;

        let sale = self
            .db
            .sales()
            .get_in(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let updated = self.db.sales().update_header(&mut tx, sale_id, &patch).await?;
        if !updated {
            return Err(CoreError::InvalidSaleState {
                sale_id: sale.id,
                status: sale.status.as_str().to_string(),
            }
            .into());
        }

        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

        self.db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Hard-deletes a pending sale and its lines. Any other status gives
    /// `InvalidSaleState`; processed history is never deleted, only
    /// cancelled.
    pub async fn delete_sale(&self, sale_id: &str) -> EngineResult<()> {
        let mut tx = self.db.begin().await?;

        let sale = self
            .db
            .sales()
            .get_in(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let deleted = self.db.sales().delete_sale(&mut tx, sale_id).await?;
        if !deleted {
            return Err(CoreError::InvalidSaleState {
                sale_id: sale.id,
                status: sale.status.as_str().to_string(),
            }
            .into());
        }

        tx.commit()
            .await
            .map_err(|e| panaderia_db::DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id, "Pending sale deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale with its lines.
    pub async fn get_sale(&self, sale_id: &str) -> EngineResult<(Sale, Vec<SaleLine>)> {
        let sale = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        let lines = self.db.sales().lines(sale_id).await?;
        Ok((sale, lines))
    }

    /// Renders a receipt for a sale, resolving product names and formatting
    /// amounts for display.
    pub async fn receipt(&self, sale_id: &str) -> EngineResult<Receipt> {
        let (sale, lines) = self.get_sale(sale_id).await?;

        let mut receipt_lines = Vec::with_capacity(lines.len());
        for line in &lines {
            let product_name = self
                .db
                .products()
                .get_by_id(&line.product_id)
                .await?
                .map(|p| p.name)
                .unwrap_or_else(|| line.product_id.clone());

            receipt_lines.push(ReceiptLine {
                product_name,
                quantity: line.quantity,
                unit_price: Money::from_cents(line.unit_price_cents).to_string(),
                line_subtotal: Money::from_cents(line.line_subtotal_cents).to_string(),
            });
        }

        Ok(Receipt {
            invoice_number: sale.invoice_number,
            employee_id: sale.employee_id,
            customer_name: sale.customer_name,
            lines: receipt_lines,
            subtotal: Money::from_cents(sale.subtotal_cents).to_string(),
            tax: Money::from_cents(sale.tax_cents).to_string(),
            total: Money::from_cents(sale.total_cents).to_string(),
            payment_method: sale.payment_method,
            issued_at: sale.created_at,
        })
    }

    /// Lists sales with filters, allow-listed sorting and pagination.
    pub async fn list_sales(&self, filter: &SaleListFilter) -> EngineResult<Vec<Sale>> {
        Ok(self.db.sales().list(filter).await?)
    }
}

// =============================================================================
// Invoice Numbers
// =============================================================================

/// Generates an invoice number: `FAC-YYYYMMDD-XXXXXX` with a random
/// uppercase-hex suffix. Uniqueness is ultimately enforced by the UNIQUE
/// index on `sales.invoice_number`.
fn generate_invoice_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: String = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("FAC-{date}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_shape() {
        let invoice = generate_invoice_number();
        let parts: Vec<&str> = invoice.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "FAC");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_ne!(invoice, generate_invoice_number());
    }
}
