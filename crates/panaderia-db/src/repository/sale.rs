//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! 1. PROCESS (normal flow)
//!    └── insert_sale() + insert_line()* + exit movements, one transaction
//!        → Sale { status: Completed }
//!
//! 2. HEADER-ONLY CREATE (legacy flow)
//!    └── insert_sale() → Sale { status: Pending }, no lines, no stock touch
//!
//! 3. CANCEL
//!    └── set_status(Cancelled) + entry movements, one transaction
//!
//! 4. EDIT / DELETE
//!    └── update_header() / delete_sale(), pending sales only
//! ```
//!
//! Status guards live in the SQL (`WHERE status = ...`) so a stale read can
//! never drive an illegal transition; the engine turns a zero-row update
//! into the proper domain error.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use panaderia_core::{Sale, SaleLine, SaleStatus};

// =============================================================================
// Listing Options
// =============================================================================

/// Sort key for sale listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleSortField {
    CreatedAt,
    Total,
    InvoiceNumber,
}

impl SaleSortField {
    fn column(&self) -> &'static str {
        match self {
            SaleSortField::CreatedAt => "created_at",
            SaleSortField::Total => "total_cents",
            SaleSortField::InvoiceNumber => "invoice_number",
        }
    }
}

/// Replacement values for a pending sale's header.
#[derive(Debug, Clone)]
pub struct SaleHeaderPatch {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: panaderia_core::PaymentMethod,
    pub notes: Option<String>,
}

/// Filters for sale listings. All fields optional; defaults list everything
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct SaleListFilter {
    pub status: Option<SaleStatus>,
    pub employee_id: Option<String>,
    /// Inclusive ISO-8601 lower bound on created_at.
    pub date_from: Option<String>,
    /// Exclusive ISO-8601 upper bound on created_at.
    pub date_to: Option<String>,
    pub sort: Option<SaleSortField>,
    pub descending: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const SALE_COLUMNS: &str = "id, invoice_number, employee_id, customer_name, customer_phone, \
     subtotal_cents, tax_cents, total_cents, payment_method, status, notes, \
     created_at, updated_at";

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Writes (inside transactions)
    // =========================================================================

    /// Inserts a sale header inside an open transaction.
    pub async fn insert_sale(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, invoice = %sale.invoice_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, invoice_number, employee_id, customer_name, customer_phone,
                subtotal_cents, tax_cents, total_cents, payment_method, status,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.invoice_number)
        .bind(&sale.employee_id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale line inside an open transaction.
    ///
    /// ## Snapshot Pattern
    /// The unit price is copied onto the line at creation, so the sale
    /// history survives later price changes.
    pub async fn insert_line(&self, conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_lines (
                id, sale_id, product_id, quantity,
                unit_price_cents, line_subtotal_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_subtotal_cents)
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Transitions a sale's status, guarded on the expected current status.
    /// Returns `false` when the sale was not in `from` (lost race or bad
    /// id); the engine maps that to the right domain error.
    pub async fn set_status(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        from: &[SaleStatus],
        to: SaleStatus,
    ) -> DbResult<bool> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE sales SET status = ");
        builder.push_bind(to);
        builder.push(", updated_at = datetime('now') WHERE id = ");
        builder.push_bind(id);
        builder.push(" AND status IN (");
        let mut separated = builder.separated(", ");
        for status in from {
            separated.push_bind(*status);
        }
        builder.push(")");

        let result = builder.build().execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Updates the editable header fields of a pending sale. Returns
    /// `false` if the sale is missing or no longer pending.
    pub async fn update_header(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        patch: &SaleHeaderPatch,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET customer_name = ?2, customer_phone = ?3,
                subtotal_cents = ?4, tax_cents = ?5, total_cents = ?6,
                payment_method = ?7, notes = ?8, updated_at = datetime('now')
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(&patch.customer_name)
        .bind(&patch.customer_phone)
        .bind(patch.subtotal_cents)
        .bind(patch.tax_cents)
        .bind(patch.total_cents)
        .bind(patch.payment_method)
        .bind(&patch.notes)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard-deletes a pending sale; lines go with it via ON DELETE CASCADE.
    /// Returns `false` if the sale is missing or not pending.
    pub async fn delete_sale(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1 AND status = 'pending'")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by invoice number.
    pub async fn get_by_invoice(&self, invoice_number: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE invoice_number = ?1"
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Reads a sale inside an open transaction, anchoring later guarded
    /// writes to the same snapshot.
    pub async fn get_in(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(sale)
    }

    /// Lists the lines of a sale in insertion order.
    pub async fn lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, quantity,
                   unit_price_cents, line_subtotal_cents, created_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists a sale's lines inside an open transaction.
    pub async fn lines_in(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, quantity,
                   unit_price_cents, line_subtotal_cents, created_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Lists sales with optional filters, sorting and pagination.
    pub async fn list(&self, filter: &SaleListFilter) -> DbResult<Vec<Sale>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1=1"));

        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        if let Some(ref employee_id) = filter.employee_id {
            builder.push(" AND employee_id = ");
            builder.push_bind(employee_id.clone());
        }
        if let Some(ref from) = filter.date_from {
            builder.push(" AND created_at >= ");
            builder.push_bind(from.clone());
        }
        if let Some(ref to) = filter.date_to {
            builder.push(" AND created_at < ");
            builder.push_bind(to.clone());
        }

        let sort = filter.sort.unwrap_or(SaleSortField::CreatedAt);
        let direction = if filter.descending || filter.sort.is_none() {
            "DESC"
        } else {
            "ASC"
        };
        builder.push(format!(" ORDER BY {} {}", sort.column(), direction));

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
            if let Some(offset) = filter.offset {
                builder.push(" OFFSET ");
                builder.push_bind(offset);
            }
        }

        let sales = builder
            .build_query_as::<Sale>()
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}
