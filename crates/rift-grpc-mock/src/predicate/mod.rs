//! Payload and metadata predicates used by the stub matcher.

mod json_match;
mod metadata;

pub use json_match::{exact_match, partial_match};
pub use metadata::metadata_matches;
