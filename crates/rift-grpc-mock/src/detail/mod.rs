//! Error detail expansion.
//!
//! Error responses may carry structured details. Each detail names a message
//! shape by `(import, type)`; the shape is looked up in a [`DetailRegistry`]
//! filled at startup, instantiated once, cached as a prototype and cloned for
//! every use.
//!
//! # Module Structure
//!
//! - `registry` - the `ErrorDetail` capability and the shape registry
//! - `engine` - prototype cache and resolution
//! - `status` - `google.rpc.Status` encoding of detailed errors
//! - `well_known` - the standard `google.rpc` detail shapes

mod engine;
mod registry;
mod status;
pub mod well_known;

pub use engine::{shape_hash, ErrorDetailEngine};
pub use registry::{DetailFactory, DetailRegistry, ErrorDetail, ProstDetail};
pub use status::{decode_details, status_with_details, RpcStatus};

use thiserror::Error;

/// Error types for detail expansion
#[derive(Debug, Error)]
pub enum DetailError {
    #[error("error details spec is incomplete: import and type are required")]
    IncompleteSpec,

    #[error("no error detail shape registered for {type_name} in {import}")]
    UnknownShape { import: String, type_name: String },

    #[error("failed to instantiate {0}: {1}")]
    Build(String, String),

    #[error("failed to populate {type_url}: {source}")]
    Populate {
        type_url: String,
        #[source]
        source: serde_json::Error,
    },
}
