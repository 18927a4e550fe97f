//! `google.rpc` error detail messages.
//!
//! Hand-written prost definitions of the standard error detail shapes so
//! stubs can use them without any generated code. Field numbers and JSON
//! names follow `google/rpc/error_details.proto`.

use super::DetailRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Import path the standard shapes are registered under
pub const WELL_KNOWN_IMPORT: &str = "google.rpc";

const TYPE_URL_PREFIX: &str = "type.googleapis.com";

macro_rules! rpc_name {
    ($ty:ident, $name:literal) => {
        impl prost::Name for $ty {
            const NAME: &'static str = $name;
            const PACKAGE: &'static str = "google.rpc";

            fn type_url() -> String {
                format!("{}/google.rpc.{}", TYPE_URL_PREFIX, $name)
            }
        }
    };
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorInfo {
    #[prost(string, tag = "1")]
    pub reason: String,
    #[prost(string, tag = "2")]
    pub domain: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}
rpc_name!(ErrorInfo, "ErrorInfo");

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreconditionFailure {
    #[prost(message, repeated, tag = "1")]
    pub violations: Vec<PreconditionViolation>,
}
rpc_name!(PreconditionFailure, "PreconditionFailure");

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreconditionViolation {
    #[prost(string, tag = "1")]
    #[serde(rename = "type")]
    pub kind: String,
    #[prost(string, tag = "2")]
    pub subject: String,
    #[prost(string, tag = "3")]
    pub description: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BadRequest {
    #[prost(message, repeated, tag = "1")]
    pub field_violations: Vec<FieldViolation>,
}
rpc_name!(BadRequest, "BadRequest");

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldViolation {
    #[prost(string, tag = "1")]
    pub field: String,
    #[prost(string, tag = "2")]
    pub description: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceInfo {
    #[prost(string, tag = "1")]
    pub resource_type: String,
    #[prost(string, tag = "2")]
    pub resource_name: String,
    #[prost(string, tag = "3")]
    pub owner: String,
    #[prost(string, tag = "4")]
    pub description: String,
}
rpc_name!(ResourceInfo, "ResourceInfo");

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugInfo {
    #[prost(string, repeated, tag = "1")]
    pub stack_entries: Vec<String>,
    #[prost(string, tag = "2")]
    pub detail: String,
}
rpc_name!(DebugInfo, "DebugInfo");

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalizedMessage {
    #[prost(string, tag = "1")]
    pub locale: String,
    #[prost(string, tag = "2")]
    pub message: String,
}
rpc_name!(LocalizedMessage, "LocalizedMessage");

impl DetailRegistry {
    /// Registry preloaded with the `google.rpc` detail shapes
    pub fn well_known() -> Self {
        let mut registry = Self::new();
        registry
            .register::<ErrorInfo>(WELL_KNOWN_IMPORT, "ErrorInfo")
            .register::<PreconditionFailure>(WELL_KNOWN_IMPORT, "PreconditionFailure")
            .register::<BadRequest>(WELL_KNOWN_IMPORT, "BadRequest")
            .register::<ResourceInfo>(WELL_KNOWN_IMPORT, "ResourceInfo")
            .register::<DebugInfo>(WELL_KNOWN_IMPORT, "DebugInfo")
            .register::<LocalizedMessage>(WELL_KNOWN_IMPORT, "LocalizedMessage");
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::{ErrorDetail, ProstDetail};
    use crate::stub::ErrorDetailsSpec;
    use serde_json::json;

    #[test]
    fn test_well_known_registry() {
        let registry = DetailRegistry::well_known();
        assert_eq!(registry.len(), 6);
        assert!(registry.contains(&ErrorDetailsSpec::new("google.rpc", "PreconditionFailure")));
    }

    #[test]
    fn test_nested_json_names() {
        let mut detail = ProstDetail::<PreconditionFailure>::default();
        detail
            .merge_json(&json!({
                "violations": [{"type": "TOS", "subject": "acme.com", "description": "not accepted"}]
            }))
            .unwrap();
        assert_eq!(detail.message().violations[0].kind, "TOS");
        assert_eq!(detail.to_json()["violations"][0]["type"], "TOS");

        let mut bad = ProstDetail::<BadRequest>::default();
        bad.merge_json(&json!({"fieldViolations": [{"field": "id"}]}))
            .unwrap();
        assert_eq!(bad.message().field_violations[0].field, "id");
        assert_eq!(
            bad.type_url(),
            "type.googleapis.com/google.rpc.BadRequest"
        );
    }
}
