//! Core logic for flatrest.
//!
//! - [`query`]: pure operations over a collection's records (lookup by id,
//!   predicate filtering, free-text search, sorting) and the query
//!   descriptor built from request parameters.
//! - [`service`]: entity-scoped CRUD on top of a
//!   [`DocumentStore`](flatrest_storage::DocumentStore).
//! - [`config`]: server configuration.

pub mod config;
pub mod error;
pub mod query;
pub mod service;

pub use config::Config;
pub use error::{AccessError, AccessResult, ConfigError};
pub use query::{QueryDescriptor, SortOrder};
pub use service::{CollectionService, EntitySummary, Listing};

pub use flatrest_storage::{Document, Record};
