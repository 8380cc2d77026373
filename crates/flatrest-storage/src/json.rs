//! JSON file-based storage implementation.
//!
//! The document lives in a single file which is read in full on every
//! `load` and overwritten in full on every `save`.

use crate::{Document, DocumentStore, StoreResult, EMPTY_DOCUMENT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default store location, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "db/store.json";

/// JSON file-based storage.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    pretty: bool,
}

impl JsonFileStore {
    /// Create a new store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: false,
        }
    }

    /// Write indented JSON instead of compact JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    /// Write `{}` to the backing file, creating parent directories.
    async fn initialize(&self) -> StoreResult<()> {
        info!(path = %self.path.display(), "Initializing empty store");

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, EMPTY_DOCUMENT).await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self) -> StoreResult<Document> {
        debug!(path = %self.path.display(), "Reading store");

        let content = match fs::read_to_string(&self.path).await {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => {
                self.initialize().await?;
                fs::read_to_string(&self.path).await?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.initialize().await?;
                fs::read_to_string(&self.path).await?
            }
            Err(e) => return Err(e.into()),
        };

        Document::parse(&content, &self.location())
    }

    async fn save(&self, document: &Document) -> StoreResult<()> {
        debug!(path = %self.path.display(), "Writing store");

        let content = document.to_json(self.pretty)?;
        fs::write(&self.path, content).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_initializes_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db").join("store.json");
        let store = JsonFileStore::new(&path);

        let doc = store.load().await.unwrap();
        assert!(doc.entity_names().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_load_initializes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "").unwrap();

        let store = JsonFileStore::new(&path);
        let doc = store.load().await.unwrap();
        assert_eq!(doc, Document::new());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{\"books\": [").unwrap();

        let store = JsonFileStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::new(&path);

        let mut doc = store.load().await.unwrap();
        let book = json!({"id": 1, "title": "A"}).as_object().cloned().unwrap();
        doc.set_records("books", vec![book]);
        store.save(&doc).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"books":[{"id":1,"title":"A"}]}"#
        );
        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded, doc);
    }

    #[tokio::test]
    async fn test_save_pretty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::new(&path).with_pretty(true);

        let mut doc = store.load().await.unwrap();
        doc.set_records("books", Vec::new());
        store.save(&doc).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"books\": []\n}"
        );
    }

    #[tokio::test]
    async fn test_every_load_rereads_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::new(&path);

        store.load().await.unwrap();
        std::fs::write(&path, r#"{"users":[]}"#).unwrap();

        let doc = store.load().await.unwrap();
        assert_eq!(doc.entity_names(), vec!["users"]);
    }
}
