//! Call forwarding and recording.

use super::connection::ConnectionFactory;
use crate::call::InboundCall;
use crate::recording::recorded_stub;
use crate::stub::{Stub, StubKind, StubStore};
use serde_json::Value;
use std::sync::Arc;
use tonic::Status;
use tracing::{debug, error, info, warn};

/// Relays calls matched by `forward` stubs and records them on request
pub struct ForwardProxy {
    connector: Arc<dyn ConnectionFactory>,
    recordings: Arc<StubStore>,
}

impl ForwardProxy {
    pub fn new(connector: Arc<dyn ConnectionFactory>, recordings: Arc<StubStore>) -> Self {
        Self {
            connector,
            recordings,
        }
    }

    pub fn recordings(&self) -> &Arc<StubStore> {
        &self.recordings
    }

    /// Relay `call` to the stub's server address.
    ///
    /// The backend's response or failure is returned unchanged. When the stub
    /// asks for recording, the outcome is appended to the recordings store
    /// first; a failure to record is logged and never changes the outcome.
    pub async fn forward(&self, stub: &Stub, call: &InboundCall) -> Result<Value, Status> {
        let forward = match (&stub.kind, &stub.forward) {
            (StubKind::Forward, Some(forward)) => forward,
            _ => {
                return Err(Status::internal(
                    "Attempt to call forward for a stub that is not of type 'forward'",
                ))
            }
        };

        info!(
            method = %call.full_method,
            address = %forward.server_address,
            "Forwarding call"
        );
        let connection = match self.connector.connect(&forward.server_address).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!(address = %forward.server_address, error = %e, "Forward connection failed");
                return Err(Status::unavailable(e.to_string()));
            }
        };

        let outcome = connection.relay(call).await;
        match &outcome {
            Ok(_) => debug!(method = %call.full_method, "Got forward response"),
            Err(status) => debug!(
                method = %call.full_method,
                code = ?status.code(),
                message = %status.message(),
                "Got forward error"
            ),
        }

        if forward.record {
            self.record(call, &outcome);
        }
        outcome
    }

    fn record(&self, call: &InboundCall, outcome: &Result<Value, Status>) {
        let stub = recorded_stub(call, outcome);
        match self.recordings.add(stub) {
            Ok(()) => debug!(method = %call.full_method, "Recorded forwarded call"),
            Err(e) => error!(
                method = %call.full_method,
                error = %e,
                "Failed to record forwarding result"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ConnectError, Connection};
    use crate::stub::{ResponseType, StubForward, StubRequest, StubResponse};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use tonic::Code;

    /// Answers every call with a fixed outcome and remembers the addresses used
    struct FixedConnector {
        outcome: Result<Value, (Code, &'static str)>,
        addresses: Mutex<Vec<String>>,
    }

    impl FixedConnector {
        fn new(outcome: Result<Value, (Code, &'static str)>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                addresses: Mutex::new(Vec::new()),
            })
        }
    }

    struct FixedConnection(Result<Value, (Code, &'static str)>);

    #[async_trait]
    impl Connection for FixedConnection {
        async fn relay(&self, _call: &InboundCall) -> Result<Value, Status> {
            self.0
                .clone()
                .map_err(|(code, message)| Status::new(code, message))
        }
    }

    #[async_trait]
    impl ConnectionFactory for FixedConnector {
        async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, ConnectError> {
            if address == "unreachable:1" {
                return Err(ConnectError::Unreachable {
                    address: address.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            self.addresses.lock().push(address.to_string());
            Ok(Box::new(FixedConnection(self.outcome.clone())))
        }
    }

    fn forward_stub(address: &str, record: bool) -> Stub {
        Stub::forward(
            "/acme.Users/Get",
            StubRequest::partial(json!({"id": 1})),
            StubForward::new(address, record),
        )
    }

    fn call() -> InboundCall {
        InboundCall::new("/acme.Users/Get", json!({"id": 1}), Default::default())
    }

    #[tokio::test]
    async fn test_forward_and_record_success() {
        let connector = FixedConnector::new(Ok(json!({"name": "real"})));
        let proxy = ForwardProxy::new(connector.clone(), Arc::new(StubStore::recording()));

        let response = proxy
            .forward(&forward_stub("backend:50051", true), &call())
            .await
            .unwrap();
        assert_eq!(response, json!({"name": "real"}));
        assert_eq!(*connector.addresses.lock(), vec!["backend:50051"]);

        let recorded = proxy.recordings().get_all();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].request.content, json!({"id": 1}));
        assert_eq!(
            recorded[0].response.as_ref().unwrap().content,
            json!({"name": "real"})
        );
    }

    #[tokio::test]
    async fn test_backend_error_is_returned_and_recorded() {
        let connector = FixedConnector::new(Err((Code::NotFound, "no such user")));
        let proxy = ForwardProxy::new(connector, Arc::new(StubStore::recording()));

        let status = proxy
            .forward(&forward_stub("backend:50051", true), &call())
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "no such user");

        let recorded = proxy.recordings().get_all();
        let response = recorded[0].response.as_ref().unwrap();
        assert_eq!(response.response_type, ResponseType::Error);
        assert_eq!(response.error.as_ref().unwrap().code, Code::NotFound as i32);
    }

    #[tokio::test]
    async fn test_no_recording_when_disabled() {
        let connector = FixedConnector::new(Ok(json!({"name": "real"})));
        let proxy = ForwardProxy::new(connector, Arc::new(StubStore::recording()));
        proxy
            .forward(&forward_stub("backend:50051", false), &call())
            .await
            .unwrap();
        assert!(proxy.recordings().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_calls_are_all_recorded() {
        let connector = FixedConnector::new(Ok(json!({"name": "real"})));
        let proxy = ForwardProxy::new(connector, Arc::new(StubStore::recording()));
        for _ in 0..3 {
            proxy
                .forward(&forward_stub("backend:50051", true), &call())
                .await
                .unwrap();
        }
        assert_eq!(proxy.recordings().len(), 3);
    }

    #[tokio::test]
    async fn test_recording_failure_does_not_change_outcome() {
        // A mock-mode store rejects the second identical recording
        let connector = FixedConnector::new(Ok(json!({"name": "real"})));
        let proxy = ForwardProxy::new(connector, Arc::new(StubStore::mock()));
        for _ in 0..2 {
            let response = proxy
                .forward(&forward_stub("backend:50051", true), &call())
                .await
                .unwrap();
            assert_eq!(response, json!({"name": "real"}));
        }
        assert_eq!(proxy.recordings().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_unavailable_and_not_recorded() {
        let connector = FixedConnector::new(Ok(json!({})));
        let proxy = ForwardProxy::new(connector, Arc::new(StubStore::recording()));
        let status = proxy
            .forward(&forward_stub("unreachable:1", true), &call())
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
        assert!(proxy.recordings().is_empty());
    }

    #[tokio::test]
    async fn test_mock_stub_cannot_be_forwarded() {
        let connector = FixedConnector::new(Ok(json!({})));
        let proxy = ForwardProxy::new(connector, Arc::new(StubStore::recording()));
        let stub = Stub::mock(
            "/acme.Users/Get",
            StubRequest::exact(json!({"id": 1})),
            StubResponse::success(json!({})),
        );
        let status = proxy.forward(&stub, &call()).await.unwrap_err();
        assert_eq!(status.code(), Code::Internal);
    }
}
