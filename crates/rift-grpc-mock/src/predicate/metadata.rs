//! Metadata constraint matching.

use crate::stub::Metadata;
use std::collections::BTreeSet;

/// Check call metadata against the constraints declared by a stub.
///
/// - No constraints: always matches
/// - Every constrained key must be present on the call (keys are case-insensitive)
/// - The expected values must equal the call's values as an unordered set
///   (values are case-sensitive)
pub fn metadata_matches(expected: &Metadata, actual: &Metadata) -> bool {
    expected.iter().all(|(key, values)| {
        let actual_values = actual
            .get(key)
            .or_else(|| actual.get(&key.to_ascii_lowercase()));
        match actual_values {
            Some(actual_values) => as_set(values) == as_set(actual_values),
            None => false,
        }
    })
}

fn as_set(values: &[String]) -> BTreeSet<&str> {
    values.iter().map(String::as_str).collect()
}
