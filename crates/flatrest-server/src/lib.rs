//! HTTP server for flatrest.
//!
//! Exposes CRUD over every collection of the store as a REST API, wrapping
//! each response in a `{success, message, length, data}` envelope.

pub mod response;
pub mod routes;
pub mod state;

pub use response::{ApiError, Envelope};
pub use routes::create_router;
pub use state::AppState;
