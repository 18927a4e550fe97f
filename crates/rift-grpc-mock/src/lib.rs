// Library exports for the gRPC mock engine, its binary, tests and benches

// ===== Stub model and matching =====
pub mod call;
pub mod matcher;
pub mod predicate;
pub mod stub;

// ===== Responses, error details and forwarding =====
pub mod detail;
pub mod proxy;
pub mod recording;
pub mod response;

// ===== Wiring =====
pub mod admin;
pub mod config;
pub mod engine;
pub mod service;

pub use call::InboundCall;
pub use detail::{DetailRegistry, ErrorDetailEngine};
pub use engine::MockEngine;
pub use matcher::StubMatcher;
pub use service::{CompositeMockService, MockService};
pub use stub::{Stub, StubStore};
