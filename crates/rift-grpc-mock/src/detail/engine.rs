//! Prototype cache over the detail registry.

use super::registry::{spec_key, DetailRegistry, ErrorDetail};
use super::DetailError;
use crate::stub::ErrorDetailsSpec;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

struct CachedShape {
    hash: String,
    prototype: Box<dyn ErrorDetail>,
}

/// Resolves detail specs to fresh, independently mutable instances.
///
/// The first resolution of a shape builds a prototype through the registry
/// and caches it; later resolutions clone the prototype. Cache entries are
/// never evicted.
pub struct ErrorDetailEngine {
    registry: DetailRegistry,
    cache: RwLock<HashMap<String, CachedShape>>,
}

impl ErrorDetailEngine {
    pub fn new(registry: DetailRegistry) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &DetailRegistry {
        &self.registry
    }

    /// Get a new instance of the shape named by `spec`
    pub fn resolve(&self, spec: &ErrorDetailsSpec) -> Result<Box<dyn ErrorDetail>, DetailError> {
        if !spec.is_complete() {
            return Err(DetailError::IncompleteSpec);
        }
        let key = spec_key(&spec.import, &spec.type_name);

        if let Some(shape) = self.cache.read().get(&key) {
            return Ok(shape.prototype.boxed_clone());
        }

        // Build outside the lock; a concurrent builder of the same shape loses
        let factory = self
            .registry
            .factory(spec)
            .ok_or_else(|| DetailError::UnknownShape {
                import: spec.import.clone(),
                type_name: spec.type_name.clone(),
            })?;
        let prototype = factory()?;
        let hash = shape_hash(spec);
        debug!(shape = %spec, hash = %hash, "Cached error detail prototype");

        let mut cache = self.cache.write();
        let shape = cache
            .entry(key)
            .or_insert(CachedShape { hash, prototype });
        Ok(shape.prototype.boxed_clone())
    }

    /// Hash of a cached shape, if it has been resolved before
    pub fn cached_hash(&self, spec: &ErrorDetailsSpec) -> Option<String> {
        self.cache
            .read()
            .get(&spec_key(&spec.import, &spec.type_name))
            .map(|shape| shape.hash.clone())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for ErrorDetailEngine {
    fn default() -> Self {
        Self::new(DetailRegistry::well_known())
    }
}

/// Hex SHA-256 of `import + type`
pub fn shape_hash(spec: &ErrorDetailsSpec) -> String {
    let mut hasher = Sha256::new();
    hasher.update(spec.import.as_bytes());
    hasher.update(spec.type_name.as_bytes());
    hex::encode(hasher.finalize())
}
