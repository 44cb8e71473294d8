//! # Domain Types
//!
//! Core domain types for the bakery back-end.
//!
//! ## Dual-Key Identity Pattern
//! Every persisted entity has:
//! - `id`: UUID v4 — immutable, used for database relations
//! - Business key (`code`, `invoice_number`, `username`) — human-readable
//!
//! ## Ownership
//! - `Product.current_stock` is mutated exclusively through the inventory
//!   ledger; the sales engine never writes it directly.
//! - `InventoryMovement` rows are append-only; only the free-text reason of
//!   adjustment rows may be edited, and only adjustments may be reversed.
//! - Auth-related `Employee` fields (`failed_login_count`, `locked_until`)
//!   belong to the auth session manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// Lifecycle status of a product. More than two states exist, so this is a
/// tagged enum rather than an `is_active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    Discontinued,
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Active
    }
}

/// A bakery product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code - unique, human-readable (e.g. "PAN-CONCHA").
    pub code: String,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Sale price in cents.
    pub price_cents: i64,

    /// Production cost in cents (for margin reporting).
    pub cost_cents: i64,

    /// Current stock level. May legitimately be 0, never negative.
    pub current_stock: i64,

    /// Threshold below which the product counts as low-stock.
    pub min_stock: i64,

    /// Category reference, if categorised.
    pub category_id: Option<String>,

    /// Lifecycle status.
    pub status: ProductStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money value.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether the product is sellable.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Whether current stock has reached the low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// Typed direction of an inventory movement.
///
/// `quantity` on a movement is always a positive magnitude; the type implies
/// the direction. `Adjustment` is the one type with no sign convention — it
/// is produced exclusively by the set-stock path, which records the signed
/// effect separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods received (restock, purchase).
    Entry,
    /// Goods leaving through a sale.
    Exit,
    /// Direct stock correction via set-stock.
    Adjustment,
    /// Goods produced in-house.
    Production,
    /// Spoilage / shrinkage write-off.
    Waste,
}

impl MovementType {
    /// Signed stock effect of a movement of this type with the given
    /// (positive) quantity. `None` for `Adjustment`, whose delta is
    /// computed from old vs new stock, not from a sign convention.
    pub fn signed_delta(&self, quantity: i64) -> Option<i64> {
        match self {
            MovementType::Entry | MovementType::Production => Some(quantity),
            MovementType::Exit | MovementType::Waste => Some(-quantity),
            MovementType::Adjustment => None,
        }
    }

    /// Whether this type debits stock (and therefore must be guarded
    /// against driving stock below zero).
    pub fn is_debit(&self) -> bool {
        matches!(self, MovementType::Exit | MovementType::Waste)
    }

    /// Stable lowercase name (matches the database representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "entry",
            MovementType::Exit => "exit",
            MovementType::Adjustment => "adjustment",
            MovementType::Production => "production",
            MovementType::Waste => "waste",
        }
    }
}

/// An append-only record of an inventory quantity change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Positive magnitude; direction implied by `movement_type`.
    pub quantity: i64,
    /// Signed effect this movement applied to `current_stock`. For
    /// entry/production this equals `quantity`, for exit/waste it is
    /// `-quantity`, for adjustments it is the new-minus-old diff.
    pub stock_delta: i64,
    pub reason: String,
    /// Originating sale for movements triggered by the sales engine.
    pub reference_id: Option<String>,
    /// User or system identifier that caused the movement.
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// The status of a sale.
///
/// ## State machine
/// ```text
/// pending ──process──► completed ──cancel──► cancelled (terminal)
///    │                     │
///    ├──cancel──► cancelled└──(reserved)──► refunded (terminal)
///    └──(hard delete)
/// ```
/// Only pending sales may be edited or hard-deleted. Any non-terminal sale
/// may be cancelled exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

impl SaleStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Cancelled | SaleStatus::Refunded)
    }

    /// Whether a sale in this status may be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, SaleStatus::Pending | SaleStatus::Completed)
    }

    /// Stable lowercase name (matches the database representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Refunded => "refunded",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// A sale transaction header.
///
/// The stored totals are authoritative for display; the lines are the audit
/// trail. `total_cents == subtotal_cents + tax_cents` is validated on write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Unique invoice number, generated when the caller does not supply one.
    pub invoice_number: String,
    pub employee_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as a Money value.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item of a sale. Immutable once created; removed only together
/// with its (pending) parent sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `quantity * unit_price_cents`, computed at creation.
    pub line_subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Employee
// =============================================================================

/// System roles (drive the static permission table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Admin,
    Manager,
    Cashier,
    Baker,
    Sales,
}

/// Employee account status. Inactive employees cannot log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

/// An employee record. Only the auth-related fields are owned by this core;
/// profile management is external.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// PHC-format password hash. Never serialized to callers.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: EmployeeRole,
    pub status: EmployeeStatus,
    /// Consecutive failed logins since the last success.
    pub failed_login_count: i64,
    /// Lockout expiry; the lock is not proactively cleared, it expires by
    /// time comparison.
    pub locked_until: Option<DateTime<Utc>>,
    pub last_access: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Whether the account rejects logins at the given instant.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Ephemeral server-side session state. Lives in a `SessionStore`, never in
/// the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    /// Opaque high-entropy token; the only key into the session store.
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub remember_me: bool,
}

impl Session {
    /// Whether the session has expired at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_movement_signed_delta() {
        assert_eq!(MovementType::Entry.signed_delta(5), Some(5));
        assert_eq!(MovementType::Production.signed_delta(5), Some(5));
        assert_eq!(MovementType::Exit.signed_delta(5), Some(-5));
        assert_eq!(MovementType::Waste.signed_delta(5), Some(-5));
        assert_eq!(MovementType::Adjustment.signed_delta(5), None);
    }

    #[test]
    fn test_movement_is_debit() {
        assert!(MovementType::Exit.is_debit());
        assert!(MovementType::Waste.is_debit());
        assert!(!MovementType::Entry.is_debit());
        assert!(!MovementType::Adjustment.is_debit());
    }

    #[test]
    fn test_sale_status_transitions() {
        assert!(SaleStatus::Pending.can_cancel());
        assert!(SaleStatus::Completed.can_cancel());
        assert!(!SaleStatus::Cancelled.can_cancel());
        assert!(!SaleStatus::Refunded.can_cancel());
        assert!(SaleStatus::Cancelled.is_terminal());
        assert!(SaleStatus::Refunded.is_terminal());
        assert!(!SaleStatus::Pending.is_terminal());
    }

    #[test]
    fn test_employee_lock_expiry() {
        let now = Utc::now();
        let employee = Employee {
            id: "e1".into(),
            username: "maria".into(),
            email: "maria@panaderia.test".into(),
            first_name: "María".into(),
            last_name: "García".into(),
            password_hash: "hash".into(),
            role: EmployeeRole::Cashier,
            status: EmployeeStatus::Active,
            failed_login_count: 5,
            locked_until: Some(now + Duration::minutes(10)),
            last_access: None,
            created_at: now,
            updated_at: now,
        };
        assert!(employee.is_locked(now));
        // The lock expires purely by time comparison.
        assert!(!employee.is_locked(now + Duration::minutes(11)));
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            user_id: "e1".into(),
            token: "tok".into(),
            issued_at: now,
            expires_at: now + Duration::hours(2),
            remember_me: false,
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn test_product_low_stock() {
        let now = Utc::now();
        let mut product = Product {
            id: "p1".into(),
            code: "PAN-BOLILLO".into(),
            name: "Bolillo".into(),
            description: None,
            price_cents: 250,
            cost_cents: 90,
            current_stock: 10,
            min_stock: 5,
            category_id: None,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert!(!product.is_low_stock());
        product.current_stock = 5;
        assert!(product.is_low_stock());
    }
}
