//! Canonical JSON fingerprints used as stub store keys.
//!
//! Two payloads that differ only in whitespace, object key order or the
//! spelling of an integral number (`1` vs `1.0`) produce the same fingerprint.

use super::types::Stub;
use serde_json::{Map, Number, Value};
use std::fmt;

/// Canonical compact JSON for a value: no insignificant whitespace,
/// object keys sorted.
pub fn canonicalize(value: &Value) -> String {
    sorted(value).to_string()
}

/// Canonicalize raw JSON text. Returns `None` if the text is not valid JSON.
pub fn canonicalize_str(raw: &str) -> Option<String> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .map(|value| canonicalize(&value))
}

// Rebuild objects in key order so the output does not depend on whether
// serde_json keeps insertion order.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        Value::Number(n) => Value::Number(integral(n)),
        other => other.clone(),
    }
}

// The matcher compares numbers by value, so integral floats key like integers
fn integral(n: &Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n.clone();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => Number::from(f as u64),
        _ => n.clone(),
    }
}

/// Store key of a stub: `(fullMethod, canonical(request.content))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubKey {
    pub full_method: String,
    pub fingerprint: String,
}

impl StubKey {
    pub fn of(stub: &Stub) -> Self {
        Self {
            full_method: stub.full_method.clone(),
            fingerprint: canonicalize(&stub.request.content),
        }
    }
}

impl fmt::Display for StubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.full_method, self.fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubRequest, StubResponse};
    use serde_json::json;

    #[test]
    fn test_whitespace_is_insignificant() {
        let a = canonicalize_str(r#"{ "id" : 1,   "name": "x" }"#).unwrap();
        let b = canonicalize_str("{\"id\":1,\n\"name\":\"x\"}").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, r#"{"id":1,"name":"x"}"#);
    }

    #[test]
    fn test_key_order_is_insignificant() {
        let a = canonicalize(&json!({"b": {"d": 1, "c": 2}, "a": [3, {"z": 1, "y": 2}]}));
        assert_eq!(a, r#"{"a":[3,{"y":2,"z":1}],"b":{"c":2,"d":1}}"#);
    }

    #[test]
    fn test_integral_floats_key_like_integers() {
        assert_eq!(canonicalize(&json!({"id": 1.0})), r#"{"id":1}"#);
        assert_eq!(canonicalize(&json!([-3.0, 0.0, 2.5])), "[-3,0,2.5]");
        assert_eq!(canonicalize_str("1e3").unwrap(), "1000");
    }

    #[test]
    fn test_invalid_json() {
        assert!(canonicalize_str("{not json").is_none());
    }

    #[test]
    fn test_stub_key() {
        let stub = Stub::mock(
            "/acme.Users/Get",
            StubRequest::partial(json!({"id": 1})),
            StubResponse::success(json!({})),
        );
        let key = StubKey::of(&stub);
        assert_eq!(key.full_method, "/acme.Users/Get");
        assert_eq!(key.fingerprint, r#"{"id":1}"#);
        assert_eq!(key.to_string(), r#"/acme.Users/Get -> {"id":1}"#);
    }
}
