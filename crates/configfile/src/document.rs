//! Canonical JSON text for config documents
//!
//! Serialized documents are pretty-printed with two-space indentation and end
//! with exactly one newline. Object keys keep their insertion order, so a
//! struct serializes in field order. The output is deterministic, which the
//! write-suppression check depends on.

use serde::Serialize;
use serde_json::Value;

/// Parse strict JSON text into an untyped document
pub fn parse(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str(text)
}

/// Serialize a value to canonical document text
pub fn serialize<S: Serialize + ?Sized>(value: &S) -> serde_json::Result<String> {
    let mut serialized = serde_json::to_string_pretty(value)?;
    serialized.push('\n');
    Ok(serialized)
}

/// Convert a typed value into an untyped document
pub fn to_document<S: Serialize + ?Sized>(value: &S) -> serde_json::Result<Value> {
    serde_json::to_value(value)
}
