//! Lenient scalar coercions for untrusted payload values.

use serde_json::Value;

/// Integer from a JSON number (floats truncate) or a numeric string.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// Hit points saturated into `i32`.
pub fn as_hp(value: &Value) -> Option<i32> {
    as_i64(value).map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Non-negative count. Negative numbers clamp to zero.
pub fn as_count(value: &Value) -> Option<u32> {
    as_i64(value).map(|v| v.clamp(0, u32::MAX as i64) as u32)
}

/// Length of a sequence. A bare number is accepted as an already-taken length.
pub fn seq_len(value: &Value) -> Option<u32> {
    match value {
        Value::Array(items) => Some(u32::try_from(items.len()).unwrap_or(u32::MAX)),
        Value::Number(_) => as_count(value),
        _ => None,
    }
}

/// Truthy flag: booleans, `1`/`0`, and `"true"`/`"false"` strings.
pub fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Non-empty trimmed text. Numbers are rendered as text.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
