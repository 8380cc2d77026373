//! Response envelope and error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use flatrest_core::AccessError;
use serde::Serialize;
use serde_json::Value;

/// Message returned for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error!";

/// The JSON body of every response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// A successful response carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            length: None,
            data: None,
        }
    }

    /// A successful response carrying one value.
    pub fn data(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            message: None,
            length: None,
            data: Some(data.into()),
        }
    }

    /// A successful response carrying a list and its length.
    pub fn list(items: Vec<Value>) -> Self {
        Self {
            success: true,
            message: None,
            length: Some(items.len()),
            data: Some(Value::Array(items)),
        }
    }

    /// A failed response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            length: None,
            data: None,
        }
    }
}

/// Which kind of call failed; lookups and mutations report a missing
/// record with different status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Mutate,
}

/// An error response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    /// Map a service error to a response.
    ///
    /// Storage failures are logged here and reported without detail.
    pub fn from_access(err: AccessError, operation: Operation) -> Self {
        match err {
            AccessError::EntityNotFound { .. } => Self::not_found(err.to_string()),
            AccessError::RecordNotFound { .. } => match operation {
                Operation::Mutate => Self::bad_request(err.to_string()),
                Operation::Read | Operation::Create => Self::not_found(err.to_string()),
            },
            AccessError::MissingId
            | AccessError::DuplicateId { .. }
            | AccessError::InvalidPayload(_) => Self::bad_request(err.to_string()),
            AccessError::ImmutableId => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            AccessError::Store(source) => {
                tracing::error!(error = %source, malformed = source.is_malformed(), "Store access failed");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::failure(self.message))).into_response()
    }
}
