//! Reusable field validators
//!
//! Validators run after filters, on the JSON value of one field.

use serde_json::Value;

/// Validator: field is required (present and not null)
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_null() {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be zero or greater
pub fn non_negative() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if let Some(num) = value.as_f64() {
            if num < 0.0 {
                Err(format!(
                    "'{}' must not be negative (value: {})",
                    field, value
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(()) // not a number; type errors are reported by deserialization
        }
    }
}

/// Validator: string length (in characters) must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if len < min {
                Err(format!(
                    "'{}' must have at least {} characters (currently: {})",
                    field, min, len
                ))
            } else if len > max {
                Err(format!(
                    "'{}' must not exceed {} characters (currently: {})",
                    field, max, len
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}
