//! Concurrent in-memory stub store.
//!
//! Stubs are grouped by full method name and kept in insertion order inside
//! each group, so the matcher sees candidates oldest first. All operations
//! go through a single readers-writer lock.

use super::fingerprint::{canonicalize, StubKey};
use super::types::Stub;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Access mode of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    /// At most one stub per key; add/update/delete are checked
    #[default]
    Mock,
    /// Append-only: stubs sharing a key are all retained
    Recording,
}

/// Error types for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("stub already exists: {0}")]
    AlreadyExists(StubKey),
    #[error("stub does not exist: {0}")]
    NotFound(StubKey),
    #[error("stubs cannot be updated in recording mode")]
    ReadOnly,
}

struct Entry {
    fingerprint: String,
    stub: Arc<Stub>,
}

/// Stub store keyed by `(fullMethod, canonical(request.content))`
pub struct StubStore {
    /// Stubs by full method, in insertion order
    stubs: RwLock<BTreeMap<String, Vec<Entry>>>,
    mode: StoreMode,
}

impl StubStore {
    pub fn new(mode: StoreMode) -> Self {
        Self {
            stubs: RwLock::new(BTreeMap::new()),
            mode,
        }
    }

    /// Store with unique-per-key semantics
    pub fn mock() -> Self {
        Self::new(StoreMode::Mock)
    }

    /// Append-only store used for recordings
    pub fn recording() -> Self {
        Self::new(StoreMode::Recording)
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Add a stub. In mock mode fails if a stub with the same key exists.
    pub fn add(&self, stub: Stub) -> Result<(), StoreError> {
        let fingerprint = canonicalize(&stub.request.content);
        let mut store = self.stubs.write();
        let entries = store.entry(stub.full_method.clone()).or_default();

        if self.mode == StoreMode::Mock && contains(entries, &fingerprint) {
            return Err(StoreError::AlreadyExists(StubKey {
                full_method: stub.full_method,
                fingerprint,
            }));
        }

        debug!(method = %stub.full_method, fingerprint = %fingerprint, "Stub added");
        entries.push(Entry {
            fingerprint,
            stub: Arc::new(stub),
        });
        Ok(())
    }

    /// Replace the stub stored under the same key, keeping its position.
    pub fn update(&self, stub: Stub) -> Result<(), StoreError> {
        if self.mode == StoreMode::Recording {
            return Err(StoreError::ReadOnly);
        }

        let key = StubKey::of(&stub);
        let mut store = self.stubs.write();
        let entry = store
            .get_mut(&key.full_method)
            .and_then(|entries| entries.iter_mut().find(|e| e.fingerprint == key.fingerprint));

        match entry {
            Some(entry) => {
                entry.stub = Arc::new(stub);
                debug!("Stub updated: {}", key);
                Ok(())
            }
            None => Err(StoreError::NotFound(key)),
        }
    }

    /// Delete every stub stored under the key of `stub`.
    pub fn delete(&self, stub: &Stub) -> Result<(), StoreError> {
        let key = StubKey::of(stub);
        let mut store = self.stubs.write();
        let Some(entries) = store.get_mut(&key.full_method) else {
            return Err(StoreError::NotFound(key));
        };

        let before = entries.len();
        entries.retain(|e| e.fingerprint != key.fingerprint);
        if entries.len() == before {
            return Err(StoreError::NotFound(key));
        }
        if entries.is_empty() {
            store.remove(&key.full_method);
        }
        debug!("Stub deleted: {}", key);
        Ok(())
    }

    /// Check whether a stub with the same key is stored
    pub fn exists(&self, stub: &Stub) -> bool {
        let fingerprint = canonicalize(&stub.request.content);
        self.stubs
            .read()
            .get(&stub.full_method)
            .is_some_and(|entries| contains(entries, &fingerprint))
    }

    /// All stubs for a method, oldest first
    pub fn get_all_for_method(&self, method: &str) -> Vec<Arc<Stub>> {
        self.stubs
            .read()
            .get(method)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.stub)).collect())
            .unwrap_or_default()
    }

    /// All stubs, grouped by method name, oldest first within a method
    pub fn get_all(&self) -> Vec<Arc<Stub>> {
        self.stubs
            .read()
            .values()
            .flat_map(|entries| entries.iter().map(|e| Arc::clone(&e.stub)))
            .collect()
    }

    pub fn delete_all_for_method(&self, method: &str) {
        if let Some(removed) = self.stubs.write().remove(method) {
            debug!(method = %method, count = removed.len(), "Stubs cleared for method");
        }
    }

    pub fn delete_all(&self) {
        self.stubs.write().clear();
        debug!("All stubs cleared");
    }

    /// Total number of stored stubs
    pub fn len(&self) -> usize {
        self.stubs.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.read().is_empty()
    }
}

impl Default for StubStore {
    fn default() -> Self {
        Self::mock()
    }
}

fn contains(entries: &[Entry], fingerprint: &str) -> bool {
    entries.iter().any(|e| e.fingerprint == fingerprint)
}
