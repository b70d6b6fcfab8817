//! Reusable field filters
//!
//! These filters run on record fields before any validator sees them

use anyhow::Result;
use serde_json::Value;

/// Filter: strip leading and trailing whitespace from text values.
///
/// Other JSON values pass through unchanged, so the type check stays with
/// deserialization.
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(text) if text.trim().len() != text.len() => {
            Ok(Value::String(text.trim().to_owned()))
        }
        other => Ok(other),
    }
}
