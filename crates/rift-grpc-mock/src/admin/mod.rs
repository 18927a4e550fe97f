//! Control-plane operations.
//!
//! Transport-free stub management: an HTTP adapter parses the request,
//! calls [`StubAdmin`] and writes [`AdminError::status_code`] and
//! [`AdminError::body`] on failure.

mod stubs;

pub use stubs::StubAdmin;

use crate::stub::{InvalidStubMessage, Stub};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

/// Error types for control-plane operations
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid stub: {}", .0.errors.join("; "))]
    Invalid(InvalidStubMessage),

    #[error("Stub not found")]
    NotFound,

    #[error("Stub already exists")]
    Conflict,

    #[error("{0}")]
    Internal(String),
}

impl AdminError {
    /// HTTP status an adapter should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::BadRequest(_) | AdminError::Invalid(_) => 400,
            AdminError::NotFound => 404,
            AdminError::Conflict => 409,
            AdminError::Internal(_) => 500,
        }
    }

    /// JSON body an adapter should answer with
    pub fn body(&self) -> Value {
        match self {
            AdminError::Invalid(message) => {
                serde_json::to_value(message).unwrap_or_else(|_| json!({ "errors": [] }))
            }
            other => json!({ "error": other.to_string() }),
        }
    }
}

/// Scope of a delete: a whole method, one stub, or everything when both are absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub: Option<Stub>,
}

impl DeleteRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn method(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            stub: None,
        }
    }

    pub fn stub(stub: Stub) -> Self {
        Self {
            method: None,
            stub: Some(stub),
        }
    }
}

/// Parse a stub from a request body; an empty body is no stub
pub fn parse_stub(body: &[u8]) -> Result<Option<Stub>, AdminError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        warn!(error = %e, "Could not read stub from request body");
        AdminError::BadRequest("could not read stubs in payload".to_string())
    })
}
