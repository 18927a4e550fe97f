//! Response construction for matched mock stubs.

mod builder;

pub use builder::{decode_response, ResponseBuilder};
