//! Forward/record proxy.
//!
//! `forward` stubs relay the call to a real backend. The outbound connection
//! is obtained through a [`ConnectionFactory`] so the relay can be replaced
//! in tests; [`GrpcConnector`] is the tonic-backed implementation.

mod connection;
mod forwarding;

pub use connection::{ConnectError, Connection, ConnectionFactory, GrpcConnector};
pub use forwarding::ForwardProxy;
