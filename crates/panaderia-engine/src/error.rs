//! # Engine Error Types
//!
//! The single error surface the endpoint layer sees: business rule
//! violations from panaderia-core merged with storage failures from
//! panaderia-db.

use panaderia_core::CoreError;
use panaderia_db::DbError;
use thiserror::Error;

/// Errors from the engine services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule or validation failure. Maps to a 4xx response.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure. Maps to a 5xx response unless
    /// [`DbError::is_transient`] suggests a retry.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl EngineError {
    /// Whether this error is a business rule violation (caller mistake)
    /// rather than an infrastructure failure.
    pub fn is_domain(&self) -> bool {
        matches!(self, EngineError::Core(_))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
