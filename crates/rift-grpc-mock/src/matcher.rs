//! Stub matching.
//!
//! For a call, candidates are the stubs stored for its method, oldest first.
//! An exact match wins over any partial match; among partial matches the
//! stub added first wins.

use crate::call::InboundCall;
use crate::predicate::{exact_match, metadata_matches, partial_match};
use crate::stub::{MatchMode, Metadata, Stub, StubStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Finds the stub that answers a call
pub struct StubMatcher {
    store: Arc<StubStore>,
}

impl StubMatcher {
    pub fn new(store: Arc<StubStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<StubStore> {
        &self.store
    }

    /// Find the best matching stub for a call
    pub fn find(&self, call: &InboundCall) -> Option<Arc<Stub>> {
        self.find_match(&call.full_method, &call.payload, &call.metadata)
    }

    /// Find the best matching stub for a method, payload and metadata
    pub fn find_match(
        &self,
        method: &str,
        payload: &Value,
        metadata: &Metadata,
    ) -> Option<Arc<Stub>> {
        // Snapshot under the read lock, compare without holding it
        let candidates = self.store.get_all_for_method(method);
        let mut first_partial: Option<Arc<Stub>> = None;

        for (index, stub) in candidates.into_iter().enumerate() {
            if !metadata_matches(&stub.request.metadata, metadata) {
                trace!(method = %method, index, "Metadata mismatch");
                continue;
            }
            match stub.request.mode {
                MatchMode::Exact => {
                    if exact_match(&stub.request.content, payload) {
                        trace!(method = %method, index, "Exact match");
                        return Some(stub);
                    }
                }
                MatchMode::Partial => {
                    if first_partial.is_none() && partial_match(&stub.request.content, payload) {
                        trace!(method = %method, index, "Partial match");
                        first_partial = Some(stub);
                    }
                }
            }
        }
        first_partial
    }
}
