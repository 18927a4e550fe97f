//! Type definitions for gRPC stubs.
//!
//! The serialized form is the one accepted by the control plane:
//!
//! ```json
//! {
//!   "fullMethod": "/acme.users.UserService/GetUser",
//!   "type": "mock",
//!   "request": { "match": "exact", "content": {"id": 1}, "metadata": {"tenant": ["a"]} },
//!   "response": { "type": "success", "content": {"name": "x"} }
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Call metadata: lowercased key to the values seen for that key.
pub type Metadata = BTreeMap<String, Vec<String>>;

// ============================================================================
// Enumerations
// ============================================================================

/// What a stub does when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StubKind {
    /// Answer with the canned response
    #[default]
    Mock,
    /// Relay the call to a real backend
    Forward,
}

/// How the request content of a stub is compared with the call payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Payload must be structurally identical to the content
    #[default]
    Exact,
    /// Content must be a subset of the payload
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Success,
    Error,
}

impl fmt::Display for StubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubKind::Mock => write!(f, "mock"),
            StubKind::Forward => write!(f, "forward"),
        }
    }
}

// ============================================================================
// Stub
// ============================================================================

/// A stored rule mapping a call pattern to a canned response or a forwarding target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stub {
    pub full_method: String,
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: StubKind,
    pub request: StubRequest,
    /// Present iff `kind` is `mock`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<StubResponse>,
    /// Present iff `kind` is `forward`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<StubForward>,
}

impl Stub {
    pub fn mock(full_method: impl Into<String>, request: StubRequest, response: StubResponse) -> Self {
        Self {
            full_method: full_method.into(),
            kind: StubKind::Mock,
            request,
            response: Some(response),
            forward: None,
        }
    }

    pub fn forward(full_method: impl Into<String>, request: StubRequest, forward: StubForward) -> Self {
        Self {
            full_method: full_method.into(),
            kind: StubKind::Forward,
            request,
            response: None,
            forward: Some(forward),
        }
    }
}

/// Match specification of a stub.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StubRequest {
    #[serde(rename = "match", alias = "mode", default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub content: Value,
    /// Expected values per metadata key. Accepts either a list or a
    /// comma-separated string per key.
    #[serde(
        default,
        deserialize_with = "deserialize_metadata",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub metadata: Metadata,
}

impl StubRequest {
    pub fn exact(content: Value) -> Self {
        Self {
            mode: MatchMode::Exact,
            content,
            metadata: Metadata::new(),
        }
    }

    pub fn partial(content: Value) -> Self {
        Self {
            mode: MatchMode::Partial,
            content,
            metadata: Metadata::new(),
        }
    }

    /// Add an expected metadata constraint
    pub fn with_metadata<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.insert(
            key.to_ascii_lowercase(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }
}

/// Canned answer of a `mock` stub.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StubResponse {
    #[serde(rename = "type", default)]
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl StubResponse {
    pub fn success(content: Value) -> Self {
        Self {
            response_type: ResponseType::Success,
            content,
            error: None,
        }
    }

    pub fn error(error: ErrorResponse) -> Self {
        Self {
            response_type: ResponseType::Error,
            content: Value::Null,
            error: Some(error),
        }
    }
}

/// Structured failure returned by an `error` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Numeric gRPC status code
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ErrorResponse {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Structured detail payloads attached to an error response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub spec: ErrorDetailsSpec,
    #[serde(default)]
    pub values: Vec<ErrorDetailsValue>,
}

/// One detail instance. `spec_override` replaces the shape declared in
/// [`ErrorDetails::spec`] for this value only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetailsValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_override: Option<ErrorDetailsSpec>,
    #[serde(default)]
    pub value: Value,
}

/// Reference to a structured message shape: module path plus type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ErrorDetailsSpec {
    #[serde(default)]
    pub import: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl ErrorDetailsSpec {
    pub fn new(import: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            import: import.into(),
            type_name: type_name.into(),
        }
    }

    /// True when both halves of the reference are present
    pub fn is_complete(&self) -> bool {
        !self.import.is_empty() && !self.type_name.is_empty()
    }
}

impl fmt::Display for ErrorDetailsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.import, self.type_name)
    }
}

/// Forwarding target of a `forward` stub.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubForward {
    pub server_address: String,
    #[serde(default)]
    pub record: bool,
}

impl StubForward {
    pub fn new(server_address: impl Into<String>, record: bool) -> Self {
        Self {
            server_address: server_address.into(),
            record,
        }
    }
}

// ============================================================================
// Metadata deserialization
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum MetadataValues {
    Many(Vec<String>),
    One(String),
}

fn deserialize_metadata<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, MetadataValues>> = Option::deserialize(deserializer)?;
    let metadata = raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, values)| {
            let values = match values {
                MetadataValues::Many(values) => values,
                MetadataValues::One(joined) => joined
                    .split(',')
                    .map(|part| part.trim().to_string())
                    .collect(),
            };
            (key.to_ascii_lowercase(), values)
        })
        .collect();
    Ok(metadata)
}
