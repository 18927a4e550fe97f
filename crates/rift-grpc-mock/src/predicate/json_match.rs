//! Exact and partial comparison of JSON payloads.
//!
//! `exact` requires the payload to be structurally identical to the expected
//! content. `partial` only requires every key of the expected content to be
//! present in the payload with an equal value; extra payload keys are ignored
//! at every nesting level. Arrays are compared element by element and must
//! have the same length in both modes.

use crate::stub::MatchMode;
use serde_json::{Number, Value};

impl MatchMode {
    /// Compare expected stub content with a call payload
    pub fn matches(&self, expected: &Value, actual: &Value) -> bool {
        values_match(expected, actual, *self)
    }
}

/// Structural equality: identical key sets and values at every level
pub fn exact_match(expected: &Value, actual: &Value) -> bool {
    values_match(expected, actual, MatchMode::Exact)
}

/// Containment: `expected` is a subset of `actual`
pub fn partial_match(expected: &Value, actual: &Value) -> bool {
    values_match(expected, actual, MatchMode::Partial)
}

fn values_match(expected: &Value, actual: &Value, mode: MatchMode) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            if mode == MatchMode::Exact && expected.len() != actual.len() {
                return false;
            }
            expected.iter().all(|(key, value)| {
                actual
                    .get(key)
                    .is_some_and(|other| values_match(value, other, mode))
            })
        }
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .zip(actual)
                    .all(|(value, other)| values_match(value, other, mode))
        }
        (Value::Number(expected), Value::Number(actual)) => numbers_equal(expected, actual),
        // null, bool, string, and any type mismatch
        (expected, actual) => expected == actual,
    }
}

// 1 and 1.0 are the same number on the wire
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
