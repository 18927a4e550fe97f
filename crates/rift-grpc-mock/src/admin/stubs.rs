//! Stub management operations.

use super::{AdminError, DeleteRequest};
use crate::engine::MockEngine;
use crate::service::MockService;
use crate::stub::{InvalidStubMessage, StoreError, Stub};
use std::sync::Arc;
use tracing::{error, info};

/// Stub management over a running engine
pub struct StubAdmin {
    engine: Arc<MockEngine>,
    service: Arc<dyn MockService>,
}

impl StubAdmin {
    pub fn new(engine: Arc<MockEngine>, service: Arc<dyn MockService>) -> Self {
        Self { engine, service }
    }

    /// All stubs, or those of one method
    pub fn list(&self, method: Option<&str>) -> Result<Vec<Arc<Stub>>, AdminError> {
        info!(method = ?method, "Admin: list stubs");
        match method {
            Some(method) => {
                self.ensure_supported(method, || format!("Unsupported method: {method}"))?;
                Ok(self.engine.stubs().get_all_for_method(method))
            }
            None => Ok(self.engine.stubs().get_all()),
        }
    }

    pub fn add(&self, stub: Stub) -> Result<(), AdminError> {
        info!(method = %stub.full_method, "Admin: add stub");
        self.check(&stub)?;

        let store = self.engine.stubs();
        if store.exists(&stub) {
            return Err(AdminError::Conflict);
        }
        store.add(stub).map_err(|e| match e {
            StoreError::AlreadyExists(_) => AdminError::Conflict,
            other => {
                error!(error = %other, "Failed to add stub");
                AdminError::Internal("Failed to add stub.".to_string())
            }
        })
    }

    pub fn update(&self, stub: Stub) -> Result<(), AdminError> {
        info!(method = %stub.full_method, "Admin: update stub");
        self.check(&stub)?;

        let store = self.engine.stubs();
        if !store.exists(&stub) {
            return Err(AdminError::NotFound);
        }
        store.update(stub).map_err(|e| match e {
            StoreError::NotFound(_) => AdminError::NotFound,
            other => {
                error!(error = %other, "Failed to update stub");
                AdminError::Internal("Failed to update stub.".to_string())
            }
        })
    }

    pub fn delete(&self, request: DeleteRequest) -> Result<(), AdminError> {
        info!(method = ?request.method, stub = request.stub.is_some(), "Admin: delete stubs");
        let store = self.engine.stubs();

        match (request.method, request.stub) {
            (Some(method), _) => {
                self.ensure_supported(&method, || {
                    format!("Can't delete stubs. Unsupported method: {method}")
                })?;
                store.delete_all_for_method(&method);
                Ok(())
            }
            (None, Some(stub)) => {
                self.ensure_supported(&stub.full_method, || unsupported(&stub))?;
                if !store.exists(&stub) {
                    return Err(AdminError::NotFound);
                }
                store.delete(&stub).map_err(|e| match e {
                    StoreError::NotFound(_) => AdminError::NotFound,
                    other => {
                        error!(error = %other, "Failed to delete stub");
                        AdminError::Internal("Failed to delete stub.".to_string())
                    }
                })
            }
            (None, None) => {
                store.delete_all();
                Ok(())
            }
        }
    }

    /// Everything recorded by forward stubs so far
    pub fn recordings(&self) -> Vec<Arc<Stub>> {
        self.engine.recordings().get_all()
    }

    /// Example stub per supported method
    pub fn examples(&self) -> Vec<Stub> {
        self.service.payload_examples()
    }

    /// Every reason this stub would be rejected. Empty means valid.
    pub fn validate(&self, stub: &Stub) -> Vec<String> {
        let mut errors = stub.validation_errors();
        if !errors.is_empty() {
            return errors;
        }
        errors.extend(self.service.validate(stub));

        // Error details must expand now, not on the first matching call
        if let Err(e) = self.engine.builder().check_details(stub) {
            errors.push(format!("Error details could not be expanded: {e}"));
        }
        errors
    }

    fn check(&self, stub: &Stub) -> Result<(), AdminError> {
        self.ensure_supported(&stub.full_method, || unsupported(stub))?;
        let errors = self.validate(stub);
        if errors.is_empty() {
            return Ok(());
        }
        Err(AdminError::Invalid(InvalidStubMessage {
            errors,
            example: self.example_for(&stub.full_method),
        }))
    }

    fn ensure_supported<F>(&self, method: &str, message: F) -> Result<(), AdminError>
    where
        F: FnOnce() -> String,
    {
        if self.service.supports(method) {
            Ok(())
        } else {
            Err(AdminError::BadRequest(message()))
        }
    }

    fn example_for(&self, method: &str) -> Option<Stub> {
        self.service
            .payload_examples()
            .into_iter()
            .find(|example| example.full_method == method)
    }
}

fn unsupported(stub: &Stub) -> String {
    format!("Method {} is not supported", stub.full_method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::InboundCall;
    use crate::detail::ErrorDetailEngine;
    use crate::proxy::GrpcConnector;
    use crate::stub::{
        ErrorDetails, ErrorDetailsSpec, ErrorDetailsValue, ErrorResponse, StubRequest,
        StubResponse, StubStore,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tonic::transport::Channel;
    use tonic::Status;

    const GET: &str = "/acme.Users/Get";
    const LIST: &str = "/acme.Users/List";

    struct Users;

    #[async_trait]
    impl MockService for Users {
        fn supported_methods(&self) -> Vec<String> {
            vec![GET.to_string(), LIST.to_string()]
        }

        fn payload_examples(&self) -> Vec<Stub> {
            vec![user_stub(0, "")]
        }

        fn validate(&self, stub: &Stub) -> Vec<String> {
            match stub.request.content.get("id") {
                Some(Value::Number(_)) => Vec::new(),
                _ => vec!["request.id must be a number".to_string()],
            }
        }

        async fn forward_request(
            &self,
            _channel: Channel,
            _call: &InboundCall,
        ) -> Result<Value, Status> {
            Err(Status::unimplemented("not used"))
        }
    }

    fn user_stub(id: u64, name: &str) -> Stub {
        Stub::mock(
            GET,
            StubRequest::exact(json!({ "id": id })),
            StubResponse::success(json!({ "name": name })),
        )
    }

    fn admin() -> StubAdmin {
        let service: Arc<dyn MockService> = Arc::new(Users);
        let engine = MockEngine::new(
            Arc::new(StubStore::mock()),
            Arc::new(StubStore::recording()),
            Arc::new(ErrorDetailEngine::default()),
            Arc::new(GrpcConnector::new(Arc::clone(&service))),
        );
        StubAdmin::new(Arc::new(engine), service)
    }

    #[test]
    fn test_add_list_and_conflict() {
        let admin = admin();
        admin.add(user_stub(1, "x")).unwrap();
        assert_eq!(admin.list(None).unwrap().len(), 1);
        assert_eq!(admin.list(Some(GET)).unwrap().len(), 1);
        assert!(admin.list(Some(LIST)).unwrap().is_empty());

        let err = admin.add(user_stub(1, "y")).unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_unsupported_method() {
        let admin = admin();
        let err = admin.list(Some("/acme.Nope/Call")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Unsupported method: /acme.Nope/Call");

        let mut stub = user_stub(1, "x");
        stub.full_method = "/acme.Nope/Call".to_string();
        assert_eq!(admin.add(stub).unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_invalid_stub_carries_example() {
        let admin = admin();
        let stub = Stub::mock(
            GET,
            StubRequest::exact(json!({"id": "one"})),
            StubResponse::success(json!({"name": "x"})),
        );
        match admin.add(stub).unwrap_err() {
            AdminError::Invalid(message) => {
                assert_eq!(message.errors, vec!["request.id must be a number"]);
                assert_eq!(message.example, Some(user_stub(0, "")));
            }
            other => panic!("expected invalid stub, got {other:?}"),
        }
    }

    #[test]
    fn test_error_details_dry_run() {
        let admin = admin();
        let details = ErrorDetails {
            spec: ErrorDetailsSpec::new("acme", "Unknown"),
            values: vec![ErrorDetailsValue::default()],
        };
        let stub = Stub::mock(
            GET,
            StubRequest::exact(json!({"id": 1})),
            StubResponse::error(ErrorResponse::new(9, "nope").with_details(details)),
        );
        let errors = admin.validate(&stub);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error details could not be expanded"));
        assert_eq!(admin.add(stub).unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_update() {
        let admin = admin();
        assert_eq!(admin.update(user_stub(1, "x")).unwrap_err().status_code(), 404);

        admin.add(user_stub(1, "x")).unwrap();
        admin.update(user_stub(1, "y")).unwrap();
        let stubs = admin.list(Some(GET)).unwrap();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].response.as_ref().unwrap().content, json!({"name": "y"}));
    }

    #[test]
    fn test_delete_scopes() {
        let admin = admin();
        admin.add(user_stub(1, "x")).unwrap();
        admin.add(user_stub(2, "y")).unwrap();

        admin.delete(DeleteRequest::stub(user_stub(1, "x"))).unwrap();
        assert_eq!(admin.list(None).unwrap().len(), 1);
        assert_eq!(
            admin
                .delete(DeleteRequest::stub(user_stub(1, "x")))
                .unwrap_err()
                .status_code(),
            404
        );

        admin.delete(DeleteRequest::method(GET)).unwrap();
        assert!(admin.list(None).unwrap().is_empty());

        admin.add(user_stub(3, "z")).unwrap();
        admin.delete(DeleteRequest::all()).unwrap();
        assert!(admin.list(None).unwrap().is_empty());

        assert_eq!(
            admin
                .delete(DeleteRequest::method("/acme.Nope/Call"))
                .unwrap_err()
                .status_code(),
            400
        );
    }

    #[test]
    fn test_examples_and_recordings() {
        let admin = admin();
        assert_eq!(admin.examples().len(), 1);
        assert!(admin.recordings().is_empty());
    }
}
