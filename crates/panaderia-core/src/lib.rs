//! # panaderia-core: Pure Business Logic
//!
//! Domain types, money arithmetic, validation and the role permission table
//! for the bakery back-end.
//!
//! ## Golden Rule: NO I/O
//! This crate performs no database access, no network and no file system
//! calls. Everything here is a pure function over its inputs, which keeps it
//! fully testable without mocks.
//!
//! ## Crate Layout
//! - [`types`] - domain entities and status enums
//! - [`money`] - integer-cents monetary values
//! - [`error`] - `CoreError` / `ValidationError`
//! - [`validation`] - input validation helpers
//! - [`permissions`] - static role → module → action table

pub mod error;
pub mod money;
pub mod permissions;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use permissions::{permissions_for_role, role_allows, Action, Module, PermissionSet};
pub use types::{
    Employee, EmployeeRole, EmployeeStatus, InventoryMovement, MovementType, PaymentMethod,
    Product, ProductStatus, Sale, SaleLine, SaleStatus, Session,
};

// =============================================================================
// Domain Constants
// =============================================================================

/// Minimum password length accepted by the strength policy.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Consecutive failed logins that trigger an account lockout.
pub const MAX_LOGIN_ATTEMPTS: i64 = 5;

/// Duration of the lockout window, in minutes.
pub const LOCKOUT_MINUTES: i64 = 15;

/// Lifetime of a regular (non-remember-me) session, in seconds.
pub const SESSION_LIFETIME_SECS: i64 = 7200;

/// Lifetime of a remember-me token, in days.
pub const REMEMBER_ME_DAYS: i64 = 30;
