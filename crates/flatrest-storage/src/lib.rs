//! Storage layer for flatrest.
//!
//! The whole dataset lives in one JSON document: an object mapping entity
//! names to arrays of records. This crate provides the document types and a
//! storage abstraction with two backends:
//! - JSON file storage (default)
//! - In-memory storage (for testing)

pub mod document;
pub mod error;
pub mod json;
pub mod memory;

pub use document::{Document, Record};
pub use error::{StoreError, StoreResult};
pub use json::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Text written to a store that is absent or empty.
pub const EMPTY_DOCUMENT: &str = "{}";

/// A backend holding the full document.
///
/// Every call goes to the backing medium; implementations keep no cache
/// between calls. Nothing serializes a `load`/`save` pair, so two writers
/// racing on the same store lose the earlier write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the whole document.
    ///
    /// An absent or empty store is initialised to `{}` first.
    async fn load(&self) -> StoreResult<Document>;

    /// Overwrite the whole document.
    async fn save(&self, document: &Document) -> StoreResult<()>;
}
