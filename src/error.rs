//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for key resolution and store access.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store handle was bound more than once
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation ran before the store handle was bound
    #[error("Cache store used before a backend was bound")]
    Uninitialized,

    /// The backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the command
    #[error("Store error: {0}")]
    Store(String),

    /// List index outside the list bounds
    #[error("Index {index} out of range for list '{key}'")]
    IndexOutOfRange { key: String, index: i64 },

    /// Value could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),
}

impl CacheError {
    /// Returns true when the failure came from the transport rather than the command.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::Unavailable(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
