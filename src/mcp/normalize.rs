//! Tool argument normalization.
//!
//! MCP clients wrap tool arguments differently: workflow nodes send
//! `[{ query: { value: {...} } }]`, `{ value: {...} }` or
//! `{ Tool_Parameters: {...} }`, chat clients send the object directly.
//! Each shape is reduced to the bare argument object here.

use serde_json::{Map, Value};
use tracing::debug;

/// Unwrap one caller-specific wrapper, if any.
///
/// A non-empty array is replaced by its first element before the object
/// rules run. At most one object rule applies.
pub fn normalize_arguments(args: Value) -> Value {
    let args = match args {
        Value::Array(items) if !items.is_empty() => {
            debug!("Unwrapping array-wrapped arguments");
            items.into_iter().next().unwrap_or(Value::Null)
        }
        other => other,
    };

    if let Value::Object(mut map) = args {
        if map.get("query").and_then(|q| q.get("value")).is_some_and(Value::is_object) {
            debug!("Extracting arguments from query.value");
            if let Some(Value::Object(mut query)) = map.remove("query") {
                return query.remove("value").unwrap_or_default();
            }
        }
        if map.get("value").is_some_and(Value::is_object) {
            debug!("Extracting arguments from value");
            return map.remove("value").unwrap_or_default();
        }
        if map.get("Tool_Parameters").is_some_and(|p| !is_falsy(p)) {
            debug!("Extracting arguments from Tool_Parameters");
            return map.remove("Tool_Parameters").unwrap_or_default();
        }
        return Value::Object(map);
    }

    match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// `null`, `false`, `0` and `""` count as "not given".
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
