//! Call-boundary dispatch.
//!
//! Generated per-method handlers hand every inbound call to a [`MockEngine`]:
//! the matcher picks a stub, then a mock stub is answered by the response
//! builder and a forward stub by the proxy.

use crate::call::InboundCall;
use crate::detail::ErrorDetailEngine;
use crate::matcher::StubMatcher;
use crate::proxy::{ConnectionFactory, ForwardProxy};
use crate::response::{decode_response, ResponseBuilder};
use crate::stub::{StubKind, StubStore};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tonic::Status;
use tracing::info;

const NO_RESPONSE: &str = "no response found";

pub struct MockEngine {
    stubs: Arc<StubStore>,
    recordings: Arc<StubStore>,
    matcher: StubMatcher,
    builder: ResponseBuilder,
    proxy: ForwardProxy,
}

impl MockEngine {
    pub fn new(
        stubs: Arc<StubStore>,
        recordings: Arc<StubStore>,
        details: Arc<ErrorDetailEngine>,
        connector: Arc<dyn ConnectionFactory>,
    ) -> Self {
        Self {
            matcher: StubMatcher::new(Arc::clone(&stubs)),
            builder: ResponseBuilder::new(details),
            proxy: ForwardProxy::new(connector, Arc::clone(&recordings)),
            stubs,
            recordings,
        }
    }

    pub fn stubs(&self) -> &Arc<StubStore> {
        &self.stubs
    }

    pub fn recordings(&self) -> &Arc<StubStore> {
        &self.recordings
    }

    pub fn builder(&self) -> &ResponseBuilder {
        &self.builder
    }

    /// Answer a call with response JSON, or the status the client should see
    pub async fn handle_json(&self, call: &InboundCall) -> Result<Value, Status> {
        let Some(stub) = self.matcher.find(call) else {
            info!(
                method = %call.full_method,
                request = %call.payload,
                "NO mock response found"
            );
            return Err(Status::not_found(NO_RESPONSE));
        };

        match stub.kind {
            StubKind::Mock => {
                let response = self.builder.build_json(&stub);
                if response.is_ok() {
                    info!(
                        method = %call.full_method,
                        request = %call.payload,
                        "Found MOCK response"
                    );
                }
                response
            }
            StubKind::Forward => self.proxy.forward(&stub, call).await,
        }
    }

    /// Answer a call with the method's typed response container
    pub async fn handle<R: DeserializeOwned>(&self, call: &InboundCall) -> Result<R, Status> {
        let content = self.handle_json(call).await?;
        decode_response(&call.full_method, content)
    }
}
