//! Outbound connections to forward targets.

use crate::call::InboundCall;
use crate::config::ForwardConfig;
use crate::service::MockService;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("invalid server address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to connect to {address}: {reason}")]
    Unreachable { address: String, reason: String },
}

/// A connection able to relay one call
#[async_trait]
pub trait Connection: Send + Sync {
    async fn relay(&self, call: &InboundCall) -> Result<Value, Status>;
}

/// Opens connections to forward targets
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, ConnectError>;
}

/// Plaintext tonic channels, relayed through a [`MockService`]
pub struct GrpcConnector {
    service: Arc<dyn MockService>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl GrpcConnector {
    pub fn new(service: Arc<dyn MockService>) -> Self {
        Self {
            service,
            connect_timeout: None,
            request_timeout: None,
        }
    }

    /// Connector with the timeouts of the `forward` config section
    pub fn from_config(service: Arc<dyn MockService>, config: &ForwardConfig) -> Self {
        let mut connector = Self::new(service);
        if let Some(timeout) = config.connect_timeout() {
            connector = connector.with_connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout() {
            connector = connector.with_request_timeout(timeout);
        }
        connector
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    fn endpoint(&self, address: &str) -> Result<Endpoint, ConnectError> {
        let uri = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        let mut endpoint =
            Endpoint::from_shared(uri).map_err(|e| ConnectError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        if let Some(timeout) = self.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }
        if let Some(timeout) = self.request_timeout {
            endpoint = endpoint.timeout(timeout);
        }
        Ok(endpoint)
    }
}

#[async_trait]
impl ConnectionFactory for GrpcConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, ConnectError> {
        // Lazy: transport failures surface as the relayed call's status
        let channel = self.endpoint(address)?.connect_lazy();
        debug!(address = %address, "Opened forward channel");
        Ok(Box::new(GrpcConnection {
            channel,
            service: Arc::clone(&self.service),
        }))
    }
}

struct GrpcConnection {
    channel: Channel,
    service: Arc<dyn MockService>,
}

#[async_trait]
impl Connection for GrpcConnection {
    async fn relay(&self, call: &InboundCall) -> Result<Value, Status> {
        self.service
            .forward_request(self.channel.clone(), call)
            .await
    }
}
