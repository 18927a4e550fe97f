//! Stub generation from relayed calls.

use crate::call::InboundCall;
use crate::stub::{ErrorResponse, Stub, StubRequest, StubResponse};
use serde_json::Value;
use tonic::Status;

/// Build an exact-match mock stub replaying `outcome` for `call`.
///
/// The request keeps the client's forwardable metadata. Failures keep the
/// status code and message; detail payloads are not recorded.
pub fn recorded_stub(call: &InboundCall, outcome: &Result<Value, Status>) -> Stub {
    let mut request = StubRequest::exact(call.payload.clone());
    request.metadata = call.forwardable_metadata();

    let response = match outcome {
        Ok(content) => StubResponse::success(content.clone()),
        Err(status) => StubResponse::error(ErrorResponse::new(
            status.code() as i32,
            status.message(),
        )),
    };
    Stub::mock(call.full_method.clone(), request, response)
}
