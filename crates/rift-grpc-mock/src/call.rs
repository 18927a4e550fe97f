//! Inbound call representation.
//!
//! Generated per-method dispatch code turns a decoded gRPC request into an
//! [`InboundCall`]: the full method name, the request as JSON and the call
//! metadata.

use crate::stub::Metadata;
use serde::Serialize;
use serde_json::Value;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, KeyAndValueRef, MetadataMap};
use tonic::Status;

/// Metadata keys owned by the transport; never matched on, recorded or relayed.
const TRANSPORT_KEYS: &[&str] = &[
    "content-type",
    "content-length",
    "user-agent",
    "te",
    "host",
    "accept-encoding",
];

#[derive(Debug, Clone, PartialEq)]
pub struct InboundCall {
    pub full_method: String,
    pub payload: Value,
    pub metadata: Metadata,
}

impl InboundCall {
    /// Metadata keys are lowercased, as gRPC does on the wire.
    pub fn new(full_method: impl Into<String>, payload: Value, metadata: Metadata) -> Self {
        let mut normalized = Metadata::new();
        for (key, values) in metadata {
            normalized
                .entry(key.to_ascii_lowercase())
                .or_default()
                .extend(values);
        }
        Self {
            full_method: full_method.into(),
            payload,
            metadata: normalized,
        }
    }

    /// Build a call from a decoded request message
    pub fn from_message<T: Serialize>(
        full_method: impl Into<String>,
        message: &T,
        metadata: Metadata,
    ) -> Result<Self, Status> {
        let payload = serde_json::to_value(message).map_err(|e| {
            Status::internal(format!("could not marshal the request to JSON: {e}"))
        })?;
        Ok(Self::new(full_method, payload, metadata))
    }

    /// Build a call from a tonic request, keeping its ASCII metadata
    pub fn from_request<T: Serialize>(
        full_method: impl Into<String>,
        request: &tonic::Request<T>,
    ) -> Result<Self, Status> {
        Self::from_message(
            full_method,
            request.get_ref(),
            metadata_from_map(request.metadata()),
        )
    }

    /// Metadata a client set on this call, without transport-owned and binary keys
    pub fn forwardable_metadata(&self) -> Metadata {
        self.metadata
            .iter()
            .filter(|(key, _)| is_forwardable(key))
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect()
    }

    /// Wrap an outgoing message in a tonic request carrying this call's metadata
    pub fn outgoing_request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        for (key, values) in self.forwardable_metadata() {
            let Ok(key) = AsciiMetadataKey::from_bytes(key.as_bytes()) else {
                continue;
            };
            for value in values {
                if let Ok(value) = AsciiMetadataValue::try_from(value.as_str()) {
                    request.metadata_mut().append(key.clone(), value);
                }
            }
        }
        request
    }
}

/// Collect the ASCII entries of a tonic metadata map
pub fn metadata_from_map(map: &MetadataMap) -> Metadata {
    let mut metadata = Metadata::new();
    for entry in map.iter() {
        if let KeyAndValueRef::Ascii(key, value) = entry {
            if let Ok(value) = value.to_str() {
                metadata
                    .entry(key.as_str().to_ascii_lowercase())
                    .or_default()
                    .push(value.to_string());
            }
        }
    }
    metadata
}

fn is_forwardable(key: &str) -> bool {
    !(key.starts_with(':')
        || key.starts_with("grpc-")
        || key.ends_with("-bin")
        || TRANSPORT_KEYS.contains(&key))
}
