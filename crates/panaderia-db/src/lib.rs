//! # panaderia-db: Persistence Gateway
//!
//! SQLite access for the bakery back-end: connection pool, embedded
//! migrations and per-aggregate repositories.
//!
//! ## Architecture Position
//! ```text
//! panaderia-engine (business flows, owns transactions)
//!      │
//!      ▼
//! panaderia-db (THIS CRATE: pool, repositories, migrations)
//!      │
//!      ▼
//! SQLite file (WAL mode) or :memory: in tests
//! ```
//!
//! ## Module Organization
//! - [`pool`] - Connection pool creation, configuration and transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//! ```rust,ignore
//! use panaderia_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./panaderia.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! db.products().apply_stock_delta(&mut tx, "p1", -4).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::employee::EmployeeRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleHeaderPatch, SaleListFilter, SaleRepository, SaleSortField};
