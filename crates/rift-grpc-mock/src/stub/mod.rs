//! Stub data model and storage.
//!
//! # Module Structure
//!
//! - `types` - Stub, request/response/forward definitions
//! - `fingerprint` - canonical JSON and store keys
//! - `store` - concurrent stub store (mock and recording modes)
//! - `validation` - structural stub validation
//! - `loader` - seed stub files

mod fingerprint;
mod loader;
mod store;
mod types;
mod validation;

pub use fingerprint::{canonicalize, canonicalize_str, StubKey};
pub use loader::load_stubs_file;
pub use store::{StoreError, StoreMode, StubStore};
pub use types::{
    ErrorDetails, ErrorDetailsSpec, ErrorDetailsValue, ErrorResponse, MatchMode, Metadata,
    ResponseType, Stub, StubForward, StubKind, StubRequest, StubResponse,
};
pub use validation::InvalidStubMessage;
