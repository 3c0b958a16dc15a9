//! Error types for viewsweep
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::store::StoreError;

/// All error types that can abort a sweep.
///
/// Individual removal failures never show up here: the engine absorbs them
/// and reports the final state through `EngineStatus` instead.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Connection missing, not SQL, or unusable for the requested operation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The leftover-view listing query failed
    #[error("Discovery failed: {0}")]
    Discovery(#[source] StoreError),

    /// Opening or preparing the session failed
    #[error("Connection error: {0}")]
    Connection(#[source] StoreError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for viewsweep operations
pub type Result<T> = std::result::Result<T, SweepError>;
