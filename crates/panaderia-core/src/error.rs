//! # Error Types
//!
//! Domain-specific error types for panaderia-core.
//!
//! ## Error Flow
//! ```text
//! ValidationError → CoreError → (panaderia-db) DbError → EngineError → caller
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product code, ids, quantities)
//! 3. Errors are enum variants, never String
//! 4. Business-rule failures carry the data the endpoint layer needs
//!    (available/requested stock, retry-after seconds, ...)

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain logic failures.
///
/// These are raised synchronously inside the transaction attempt that
/// detected them; the persistence layer rolls back before they surface.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Referenced sale does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Referenced movement does not exist.
    #[error("Movement not found: {0}")]
    MovementNotFound(String),

    /// A debiting movement would drive stock below zero.
    ///
    /// Carries the quantities so the caller can report
    /// "available X, requested Y" without a second read.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The sale is not in a state that allows the requested operation
    /// (e.g. editing or deleting a non-pending sale).
    #[error("Sale {sale_id} is {status}, cannot perform operation")]
    InvalidSaleState { sale_id: String, status: String },

    /// Cancelling a sale that is already cancelled.
    #[error("Sale {0} is already cancelled")]
    AlreadyCancelled(String),

    /// `set_stock` called with the current stock value; no movement is
    /// recorded for a zero diff.
    #[error("Stock for product {product_id} is already {stock}")]
    StockUnchanged { product_id: String, stock: i64 },

    /// Only adjustment movements may be edited or reversed.
    #[error("Movement {movement_id} is {movement_type}, only adjustments allowed")]
    NotAnAdjustment {
        movement_id: String,
        movement_type: String,
    },

    /// Login rejected while the account lockout window is active.
    #[error("Account temporarily locked, retry in {retry_after_secs}s")]
    AccountLocked { retry_after_secs: i64 },

    /// Generic credential failure. Deliberately carries no detail about
    /// which half of the pair was wrong (prevents account enumeration).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session, or the session expired.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The authenticated role lacks permission for the module/action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// New password and confirmation differ.
    #[error("New passwords do not match")]
    PasswordMismatch,

    /// New password fails the strength policy.
    #[error("Password does not meet the strength policy: {0}")]
    WeakPassword(String),

    /// Current password did not verify during a password change.
    #[error("Current password is incorrect")]
    CurrentPasswordMismatch,

    /// Password hashing/verification machinery failed (malformed stored
    /// hash, etc.). Not a credential mismatch.
    #[error("Credential processing error: {0}")]
    Credential(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors: bad shape or range, always recoverable,
/// reported with field-level detail.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Invalid format (malformed id, inconsistent totals, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
