//! Lenient readers for vendor JSON.
//!
//! Vendors are inconsistent about whether numbers arrive as JSON numbers or
//! strings (`"rate": "0.90"` vs `"rate": 0.9`). These helpers accept both.

use serde_json::Value;

/// Reads a string or number as an owned string.
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a finite float from a number or a numeric string.
pub fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Reads a non-negative integer from a number or a numeric string.
///
/// Fractional values are truncated.
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
        }
        _ => None,
    }
}

/// Convenience lookup of an object field followed by a reader.
pub fn field<T>(obj: &Value, key: &str, read: impl Fn(&Value) -> Option<T>) -> Option<T> {
    obj.get(key).and_then(read)
}
