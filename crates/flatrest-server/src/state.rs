//! Server state.

use flatrest_core::CollectionService;
use flatrest_storage::DocumentStore;
use std::sync::Arc;

/// Shared application state.
///
/// Holds no data of its own: every request goes back to the store.
#[derive(Clone)]
pub struct AppState {
    /// CRUD over the store's collections.
    pub service: CollectionService,
}

impl AppState {
    /// Create a new app state over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            service: CollectionService::new(store),
        }
    }
}
