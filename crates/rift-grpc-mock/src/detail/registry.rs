//! Registry of error detail shapes.
//!
//! A shape is any structured message that can be filled from JSON and packed
//! into a `google.protobuf.Any`. Shapes are registered once at startup under
//! their `(import, type)` reference; nothing is loaded at run time.

use super::DetailError;
use crate::stub::ErrorDetailsSpec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A structured error detail instance
pub trait ErrorDetail: Send + Sync + fmt::Debug {
    /// `type_url` written into the packed `Any`
    fn type_url(&self) -> String;

    /// Overlay the fields present in `value` onto this instance
    fn merge_json(&mut self, value: &Value) -> Result<(), DetailError>;

    fn to_any(&self) -> prost_types::Any;

    fn to_json(&self) -> Value;

    fn boxed_clone(&self) -> Box<dyn ErrorDetail>;
}

/// [`ErrorDetail`] over a prost message that also speaks serde
#[derive(Debug, Clone, Default)]
pub struct ProstDetail<T> {
    message: T,
}

impl<T> ProstDetail<T> {
    pub fn new(message: T) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &T {
        &self.message
    }

    pub fn into_inner(self) -> T {
        self.message
    }
}

impl<T> ErrorDetail for ProstDetail<T>
where
    T: prost::Message + prost::Name + Serialize + DeserializeOwned + Clone + 'static,
{
    fn type_url(&self) -> String {
        T::type_url()
    }

    fn merge_json(&mut self, value: &Value) -> Result<(), DetailError> {
        let populate = |source| DetailError::Populate {
            type_url: T::type_url(),
            source,
        };

        let merged = match (serde_json::to_value(&self.message), value) {
            (Ok(Value::Object(mut base)), Value::Object(fields)) => {
                for (key, field) in fields {
                    base.insert(key.clone(), field.clone());
                }
                Value::Object(base)
            }
            _ => value.clone(),
        };
        self.message = serde_json::from_value(merged).map_err(populate)?;
        Ok(())
    }

    fn to_any(&self) -> prost_types::Any {
        prost_types::Any {
            type_url: T::type_url(),
            value: self.message.encode_to_vec(),
        }
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&self.message).unwrap_or(Value::Null)
    }

    fn boxed_clone(&self) -> Box<dyn ErrorDetail> {
        Box::new(self.clone())
    }
}

/// Builds a fresh instance of one shape
pub type DetailFactory = Arc<dyn Fn() -> Result<Box<dyn ErrorDetail>, DetailError> + Send + Sync>;

/// Shape factories keyed by `"<import>-<type>"`
#[derive(Clone, Default)]
pub struct DetailRegistry {
    factories: HashMap<String, DetailFactory>,
}

impl DetailRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prost message type under `(import, type_name)`
    pub fn register<T>(&mut self, import: &str, type_name: &str) -> &mut Self
    where
        T: prost::Message + prost::Name + Serialize + DeserializeOwned + Clone + Default + 'static,
    {
        self.register_factory(import, type_name, || {
            Ok(Box::new(ProstDetail::<T>::default()) as Box<dyn ErrorDetail>)
        })
    }

    /// Register a custom factory under `(import, type_name)`
    pub fn register_factory<F>(&mut self, import: &str, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn ErrorDetail>, DetailError> + Send + Sync + 'static,
    {
        self.factories
            .insert(spec_key(import, type_name), Arc::new(factory));
        self
    }

    /// Builder-style [`DetailRegistry::register`]
    pub fn with<T>(mut self, import: &str, type_name: &str) -> Self
    where
        T: prost::Message + prost::Name + Serialize + DeserializeOwned + Clone + Default + 'static,
    {
        self.register::<T>(import, type_name);
        self
    }

    pub fn factory(&self, spec: &ErrorDetailsSpec) -> Option<&DetailFactory> {
        self.factories
            .get(&spec_key(&spec.import, &spec.type_name))
    }

    pub fn contains(&self, spec: &ErrorDetailsSpec) -> bool {
        self.factory(spec).is_some()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for DetailRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("DetailRegistry")
            .field("shapes", &keys)
            .finish()
    }
}

pub(crate) fn spec_key(import: &str, type_name: &str) -> String {
    format!("{import}-{type_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::well_known::{ErrorInfo, WELL_KNOWN_IMPORT};
    use serde_json::json;

    #[test]
    fn test_register_and_lookup() {
        let registry = DetailRegistry::new().with::<ErrorInfo>(WELL_KNOWN_IMPORT, "ErrorInfo");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&ErrorDetailsSpec::new(WELL_KNOWN_IMPORT, "ErrorInfo")));
        assert!(!registry.contains(&ErrorDetailsSpec::new(WELL_KNOWN_IMPORT, "RetryInfo")));
        assert!(!registry.contains(&ErrorDetailsSpec::new("other", "ErrorInfo")));
    }

    #[test]
    fn test_merge_json_overlays_fields() {
        let mut detail = ProstDetail::new(ErrorInfo {
            reason: "QUOTA".to_string(),
            domain: "acme.com".to_string(),
            ..Default::default()
        });
        detail.merge_json(&json!({"reason": "EXPIRED"})).unwrap();
        assert_eq!(detail.message().reason, "EXPIRED");
        assert_eq!(detail.message().domain, "acme.com");
    }

    #[test]
    fn test_merge_json_rejects_wrong_types() {
        let mut detail = ProstDetail::<ErrorInfo>::default();
        let err = detail.merge_json(&json!({"reason": 42})).unwrap_err();
        assert!(matches!(err, DetailError::Populate { .. }));
    }

    #[test]
    fn test_to_any_round_trip() {
        let mut detail = ProstDetail::<ErrorInfo>::default();
        detail.merge_json(&json!({"reason": "QUOTA"})).unwrap();
        let any = detail.to_any();
        assert_eq!(any.type_url, "type.googleapis.com/google.rpc.ErrorInfo");
        let decoded = <ErrorInfo as prost::Message>::decode(any.value.as_slice()).unwrap();
        assert_eq!(decoded.reason, "QUOTA");
    }

    #[test]
    fn test_custom_factory_failure() {
        let mut registry = DetailRegistry::new();
        registry.register_factory("acme", "Broken", || {
            Err(DetailError::Build("acme-Broken".to_string(), "no default".to_string()))
        });
        let factory = registry
            .factory(&ErrorDetailsSpec::new("acme", "Broken"))
            .unwrap();
        assert!(matches!(factory(), Err(DetailError::Build(..))));
    }
}
