//! Error types for the core crate.

use flatrest_storage::StoreError;
use thiserror::Error;

/// Errors raised by the collection access service.
///
/// The display strings are the messages returned to API clients, except
/// for [`AccessError::Store`] which is never shown to them.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The collection is absent or has no records.
    #[error("No {entity} found!")]
    EntityNotFound { entity: String },

    /// No record in the collection has the requested id.
    #[error("{entity} with id {id} not found!")]
    RecordNotFound { entity: String, id: String },

    /// A new record has no usable `id`.
    #[error("Please provide an id for the record")]
    MissingId,

    /// A new record reuses an existing `id`.
    #[error("Please enter a unique ID")]
    DuplicateId { id: String },

    /// An update payload tries to set `id`.
    #[error("You cannot change the id of the record")]
    ImmutableId,

    /// The request body is not a JSON object.
    #[error("Invalid record: {0}")]
    InvalidPayload(String),

    /// The store could not be read or written, or holds corrupt data.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// A setting could not be parsed.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
