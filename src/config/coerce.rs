//! Lenient conversion of host option values.
//!
//! Hosts store checkbox options as `true`, `1` or `"1"` interchangeably.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Convert a JSON value to a string representation.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

/// Convert a JSON value to a boolean if possible.
pub fn value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::Null => Some(false),
        _ => None,
    }
}

/// Non-empty trimmed string, or `None`.
pub fn value_to_text(value: &Value) -> Option<String> {
    let text = value_to_string(value);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Convert a JSON value to an unsigned integer if possible.
///
/// Empty strings and `null` read as `0`.
pub fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => Some(0),
        _ => None,
    }
}

/// `deserialize_with` for checkbox options.
pub fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_bool(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a boolean option, got {value}")))
}

/// `deserialize_with` for numeric options.
pub fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_u64(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer option, got {value}")))
}

/// `deserialize_with` for optional numeric options; empty means unset.
pub fn lenient_optional_u64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        _ => value_to_u64(&value).map(Some).ok_or_else(|| {
            D::Error::custom(format!("expected a non-negative integer option, got {value}"))
        }),
    }
}
