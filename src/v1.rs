//! Access helpers for the loosely-structured v1 input.
//!
//! The v1 format was only ever validated by the application that wrote it, so
//! conversion walks raw [`serde_json::Value`] trees and reports precise
//! schema violations instead of leaning on typed deserialization.

use serde_json::{Map, Value};

use crate::error::SchemaViolation;

/// Field names a v1 history record may carry besides `time_created`.
pub const HISTORY_FIELDS: [&str; 5] = ["title", "username", "password", "url", "notes"];

pub fn object<'a>(
    value: &'a Value,
    what: &'static str,
    context: &str,
) -> Result<&'a Map<String, Value>, SchemaViolation> {
    value.as_object().ok_or_else(|| SchemaViolation::NotAnObject {
        what,
        context: context.to_string(),
    })
}

pub fn array<'a>(
    value: &'a Value,
    field: &'static str,
    context: &str,
) -> Result<&'a [Value], SchemaViolation> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| SchemaViolation::WrongType {
            context: context.to_string(),
            field: field.to_string(),
            expected: "an array",
        })
}
