//! Structural validation of stubs.
//!
//! Schema-level checks (field names and types against the service
//! descriptors) belong to the per-service validators, see
//! [`crate::service::MockService::validate`].

use super::types::{ResponseType, Stub, StubKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body returned to the control plane when a stub is rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidStubMessage {
    pub errors: Vec<String>,
    /// Example stub for the same method, when one is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Stub>,
}

impl Stub {
    /// Structural problems with this stub. Empty means valid.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.full_method.is_empty() {
            errors.push("Method can't be empty.".to_string());
        }
        if is_empty_content(&self.request.content) {
            errors.push("Request content can't be empty.".to_string());
        } else if !self.request.content.is_object() {
            errors.push("Request content must be a JSON object.".to_string());
        }

        match self.kind {
            StubKind::Mock => self.check_mock(&mut errors),
            StubKind::Forward => self.check_forward(&mut errors),
        }
        errors
    }

    fn check_mock(&self, errors: &mut Vec<String>) {
        if self.forward.is_some() {
            errors.push("Stub must not contain a forward definition if its type is 'mock'.".to_string());
        }
        let Some(response) = &self.response else {
            errors.push("Response can't be empty when stub's type is 'mock'.".to_string());
            return;
        };
        match response.response_type {
            ResponseType::Success => {
                if is_empty_content(&response.content) {
                    errors.push(
                        "Response content is mandatory when the response type is 'success'."
                            .to_string(),
                    );
                }
            }
            ResponseType::Error => match &response.error {
                None => errors.push(
                    "Response error is mandatory when the response type is 'error'.".to_string(),
                ),
                Some(error) => {
                    if let Some(details) = &error.details {
                        if !details.spec.is_complete() {
                            errors.push(
                                "Error details spec must declare both 'import' and 'type'."
                                    .to_string(),
                            );
                        }
                    }
                }
            },
        }
    }

    fn check_forward(&self, errors: &mut Vec<String>) {
        if self.response.is_some() {
            errors.push("Stub must not contain a response definition if its type is 'forward'.".to_string());
        }
        match &self.forward {
            None => errors.push(
                "Stub must contain a forward definition if its type is 'forward'.".to_string(),
            ),
            Some(forward) if forward.server_address.trim().is_empty() => errors.push(
                "You must provide a server address for forwarding stub types.".to_string(),
            ),
            Some(_) => {}
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

fn is_empty_content(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
