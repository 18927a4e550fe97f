//! Per-schema mock service capability.
//!
//! Each generated service module implements [`MockService`] for the methods
//! it knows: example stubs, schema validation of stub payloads, and relaying
//! a call to a real backend. [`CompositeMockService`] serves several of them
//! behind one value.

use crate::call::InboundCall;
use crate::stub::Stub;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tonic::transport::Channel;
use tonic::Status;

#[async_trait]
pub trait MockService: Send + Sync {
    /// Full method names this service answers, e.g. `/acme.Users/Get`
    fn supported_methods(&self) -> Vec<String>;

    /// One example stub per method
    fn payload_examples(&self) -> Vec<Stub>;

    /// Schema problems of a stub's request and response content
    fn validate(&self, _stub: &Stub) -> Vec<String> {
        Vec::new()
    }

    /// Relay a call to a real backend over `channel`, returning the response as JSON
    async fn forward_request(&self, channel: Channel, call: &InboundCall)
        -> Result<Value, Status>;

    fn supports(&self, method: &str) -> bool {
        self.supported_methods().iter().any(|m| m == method)
    }
}

/// Several services presented as one
#[derive(Clone, Default)]
pub struct CompositeMockService {
    services: Vec<Arc<dyn MockService>>,
}

impl CompositeMockService {
    pub fn new(services: Vec<Arc<dyn MockService>>) -> Self {
        Self { services }
    }

    pub fn push(&mut self, service: Arc<dyn MockService>) {
        self.services.push(service);
    }

    fn service_for(&self, method: &str) -> Option<&Arc<dyn MockService>> {
        self.services.iter().find(|s| s.supports(method))
    }
}

#[async_trait]
impl MockService for CompositeMockService {
    fn supported_methods(&self) -> Vec<String> {
        self.services
            .iter()
            .flat_map(|s| s.supported_methods())
            .collect()
    }

    fn payload_examples(&self) -> Vec<Stub> {
        self.services
            .iter()
            .flat_map(|s| s.payload_examples())
            .collect()
    }

    fn validate(&self, stub: &Stub) -> Vec<String> {
        match self.service_for(&stub.full_method) {
            Some(service) => service.validate(stub),
            None => vec![format!("Method {} is not supported.", stub.full_method)],
        }
    }

    async fn forward_request(
        &self,
        channel: Channel,
        call: &InboundCall,
    ) -> Result<Value, Status> {
        match self.service_for(&call.full_method) {
            Some(service) => service.forward_request(channel, call).await,
            None => Err(Status::not_found(format!(
                "Method {} is not supported.",
                call.full_method
            ))),
        }
    }

    fn supports(&self, method: &str) -> bool {
        self.service_for(method).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubRequest, StubResponse};
    use serde_json::json;
    use tonic::transport::Endpoint;
    use tonic::Code;

    struct Users;

    #[async_trait]
    impl MockService for Users {
        fn supported_methods(&self) -> Vec<String> {
            vec!["/acme.Users/Get".to_string()]
        }

        fn payload_examples(&self) -> Vec<Stub> {
            vec![Stub::mock(
                "/acme.Users/Get",
                StubRequest::exact(json!({"id": 0})),
                StubResponse::success(json!({"name": ""})),
            )]
        }

        fn validate(&self, stub: &Stub) -> Vec<String> {
            if stub.request.content.get("id").is_some() {
                Vec::new()
            } else {
                vec!["request.id is required".to_string()]
            }
        }

        async fn forward_request(
            &self,
            _channel: Channel,
            call: &InboundCall,
        ) -> Result<Value, Status> {
            Ok(json!({ "echo": call.payload }))
        }
    }

    struct Orders;

    #[async_trait]
    impl MockService for Orders {
        fn supported_methods(&self) -> Vec<String> {
            vec!["/acme.Orders/List".to_string()]
        }

        fn payload_examples(&self) -> Vec<Stub> {
            Vec::new()
        }

        async fn forward_request(
            &self,
            _channel: Channel,
            _call: &InboundCall,
        ) -> Result<Value, Status> {
            Err(Status::unavailable("backend down"))
        }
    }

    fn composite() -> CompositeMockService {
        CompositeMockService::new(vec![Arc::new(Users), Arc::new(Orders)])
    }

    fn lazy_channel() -> Channel {
        Endpoint::from_static("http://127.0.0.1:1").connect_lazy()
    }

    #[test]
    fn test_methods_and_examples_are_merged() {
        let service = composite();
        assert_eq!(
            service.supported_methods(),
            vec!["/acme.Users/Get", "/acme.Orders/List"]
        );
        assert_eq!(service.payload_examples().len(), 1);
        assert!(service.supports("/acme.Orders/List"));
        assert!(!service.supports("/acme.Orders/Delete"));
    }

    #[test]
    fn test_validate_delegates_by_method() {
        let service = composite();
        let stub = Stub::mock(
            "/acme.Users/Get",
            StubRequest::exact(json!({"name": "x"})),
            StubResponse::success(json!({})),
        );
        assert_eq!(service.validate(&stub), vec!["request.id is required"]);

        let mut unsupported = stub.clone();
        unsupported.full_method = "/acme.Nope/Call".to_string();
        assert_eq!(
            service.validate(&unsupported),
            vec!["Method /acme.Nope/Call is not supported."]
        );
    }

    #[tokio::test]
    async fn test_forward_routes_by_method() {
        let service = composite();
        let call = InboundCall::new("/acme.Users/Get", json!({"id": 1}), Default::default());
        let response = service.forward_request(lazy_channel(), &call).await.unwrap();
        assert_eq!(response, json!({"echo": {"id": 1}}));

        let call = InboundCall::new("/acme.Orders/List", json!({}), Default::default());
        let err = service.forward_request(lazy_channel(), &call).await.unwrap_err();
        assert_eq!(err.code(), Code::Unavailable);
    }

    #[tokio::test]
    async fn test_forward_unsupported_method() {
        let call = InboundCall::new("/acme.Nope/Call", json!({}), Default::default());
        let err = composite()
            .forward_request(lazy_channel(), &call)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
        assert_eq!(err.message(), "Method /acme.Nope/Call is not supported.");
    }
}
