//! In-memory storage implementation for testing.

use crate::{Document, DocumentStore, StoreError, StoreResult, EMPTY_DOCUMENT};
use async_trait::async_trait;
use std::sync::RwLock;

const LOCATION: &str = "<memory>";

/// In-memory storage for testing.
///
/// Holds the document as JSON text, so it goes through the same parse and
/// empty-initialisation path as the file store.
pub struct MemoryStore {
    content: RwLock<String>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::with_content("")
    }

    /// Create a store holding the given document text.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: RwLock::new(content.into()),
        }
    }

    /// The current document text.
    pub fn content(&self) -> StoreResult<String> {
        let content = self
            .content
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(content.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self) -> StoreResult<Document> {
        let mut content = self
            .content
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        if content.trim().is_empty() {
            *content = EMPTY_DOCUMENT.to_string();
        }

        Document::parse(&content, LOCATION)
    }

    async fn save(&self, document: &Document) -> StoreResult<()> {
        let json = document.to_json(false)?;

        let mut content = self
            .content
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        *content = json;

        Ok(())
    }
}
