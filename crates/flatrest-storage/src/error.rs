//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error while writing the document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored text is not valid JSON
    #[error("Malformed store at {location}: {message}")]
    Malformed { location: String, message: String },

    /// The stored JSON is valid but its top level is not an object
    #[error("Store at {location} does not contain a JSON object")]
    NotAnObject { location: String },

    /// An entity's value is not an array of objects
    #[error("Collection {entity} is invalid: {message}")]
    InvalidCollection { entity: String, message: String },

    /// Lock was poisoned (another thread panicked while holding the lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Create a malformed store error from a parse failure.
    pub fn malformed(location: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Malformed {
            location: location.into(),
            message: err.to_string(),
        }
    }

    /// Whether the error means the stored data itself is corrupt.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. } | Self::NotAnObject { .. } | Self::InvalidCollection { .. }
        )
    }
}
