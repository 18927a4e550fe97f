//! Response builder.
//!
//! Turns the `response` of a matched mock stub into either a response value
//! or a gRPC failure carrying expanded error details.

use crate::detail::{status_with_details, DetailError, ErrorDetailEngine};
use crate::stub::{ErrorDetails, ErrorResponse, ResponseType, Stub};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tonic::{Code, Status};
use tracing::{debug, error};

const UNMARSHAL_FAILED: &str = "could not unmarshal response";
const EXPANSION_FAILED: &str = "Expansion of error response failed";

pub struct ResponseBuilder {
    details: Arc<ErrorDetailEngine>,
}

impl ResponseBuilder {
    pub fn new(details: Arc<ErrorDetailEngine>) -> Self {
        Self { details }
    }

    pub fn details(&self) -> &Arc<ErrorDetailEngine> {
        &self.details
    }

    /// Response content of a success stub, or the failure of an error stub
    pub fn build_json(&self, stub: &Stub) -> Result<Value, Status> {
        let Some(response) = &stub.response else {
            return Err(Status::internal(format!(
                "stub for {} has no response",
                stub.full_method
            )));
        };
        match response.response_type {
            ResponseType::Success => Ok(response.content.clone()),
            ResponseType::Error => match &response.error {
                Some(err) => Err(self.build_error(err)),
                None => Err(Status::internal(format!(
                    "error stub for {} has no error",
                    stub.full_method
                ))),
            },
        }
    }

    /// Typed variant of [`ResponseBuilder::build_json`]
    pub fn build<R: DeserializeOwned>(&self, stub: &Stub) -> Result<R, Status> {
        let content = self.build_json(stub)?;
        decode_response(&stub.full_method, content)
    }

    /// Failure status for an error response, details expanded
    pub fn build_error(&self, err: &ErrorResponse) -> Status {
        let code = Code::from(err.code);
        let Some(details) = &err.details else {
            return Status::new(code, err.message.clone());
        };
        match self.expand_details(details) {
            Ok(packed) => status_with_details(code, err.message.clone(), packed),
            Err(e) => {
                error!(error = %e, "Expansion of error response failed");
                Status::internal(EXPANSION_FAILED)
            }
        }
    }

    /// Expand the error details of a stub, if it has any, and discard the result
    pub fn check_details(&self, stub: &Stub) -> Result<(), DetailError> {
        let details = stub
            .response
            .as_ref()
            .and_then(|response| response.error.as_ref())
            .and_then(|err| err.details.as_ref());
        match details {
            Some(details) => self.expand_details(details).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Resolve and populate every detail value, in declaration order.
    ///
    /// Values with a `specOverride` naming an import use that shape;
    /// all others use a fresh instance of the base shape.
    pub fn expand_details(
        &self,
        details: &ErrorDetails,
    ) -> Result<Vec<prost_types::Any>, DetailError> {
        debug!(shape = %details.spec, "Creating instance of base error");
        let base = self.details.resolve(&details.spec)?;

        let mut packed = Vec::with_capacity(details.values.len());
        for value in &details.values {
            let mut instance = match &value.spec_override {
                Some(spec) if !spec.import.is_empty() => {
                    debug!(shape = %spec, "Creating instance of overriding error");
                    self.details.resolve(spec)?
                }
                _ => base.boxed_clone(),
            };
            instance.merge_json(&value.value)?;
            packed.push(instance.to_any());
        }
        Ok(packed)
    }
}

/// Decode response JSON into the method's typed response container
pub fn decode_response<R: DeserializeOwned>(method: &str, content: Value) -> Result<R, Status> {
    R::deserialize(&content).map_err(|e| {
        error!(method = %method, content = %content, error = %e, "Error decoding response");
        Status::internal(UNMARSHAL_FAILED)
    })
}
