//! Structural change detection for payloads
//!
//! Payloads are dynamically shaped (`items` and `props` hold arbitrary JSON),
//! so equality is defined on a canonical serialization: every object has its
//! keys sorted, recursively, and the resulting JSON bytes are compared.

use serde_json::{Map, Value};
use vitals_hud_types::DataPayload;

/// Canonical byte representation of a payload
pub fn fingerprint(payload: &DataPayload) -> Vec<u8> {
    let value = serde_json::to_value(payload).unwrap_or(Value::Null);
    serde_json::to_vec(&canonicalize(value)).unwrap_or_default()
}

/// True if `next` differs from `previous`, or there is no previous payload
pub fn payload_changed(previous: Option<&DataPayload>, next: &DataPayload) -> bool {
    match previous {
        Some(previous) => fingerprint(previous) != fingerprint(next),
        None => true,
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
