//! # panaderia-engine: Business Flows
//!
//! The three services an endpoint layer calls into, each orchestrating its
//! multi-table writes through a single panaderia-db transaction:
//!
//! - [`ledger::InventoryLedger`] - movement recording, set-stock, bulk
//!   adjustments, reversals
//! - [`sales::SalesEngine`] - atomic sale processing and cancellation
//! - [`auth::AuthSessionManager`] - login/lockout/session state machine
//!
//! ## Supporting Modules
//! - [`clock`] - injectable time source
//! - [`hasher`] - Argon2 password hashing behind a trait
//! - [`session`] - opaque tokens and the in-memory session store
//! - [`remember`] - signed remember-me tokens
//! - [`config`] - environment-driven tunables
//!
//! ## Usage
//! ```rust,ignore
//! use panaderia_db::{Database, DbConfig};
//! use panaderia_engine::sales::{NewSale, NewSaleLine, SalesEngine};
//!
//! let db = Database::new(DbConfig::new("./panaderia.db")).await?;
//! let engine = SalesEngine::new(db);
//! let (sale, lines) = engine.process_sale(header, lines).await?;
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod remember;
pub mod sales;
pub mod session;

pub use auth::{AuthSessionManager, AuthStatus, EmployeeProfile, LoginOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use error::{EngineError, EngineResult};
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use ledger::{
    BulkAdjustItem, BulkAdjustOutcome, InventoryLedger, NewMovement, StockAdjustment,
};
pub use sales::{NewSale, NewSaleLine, Receipt, SalesEngine};
pub use session::{InMemorySessionStore, SessionStore};
