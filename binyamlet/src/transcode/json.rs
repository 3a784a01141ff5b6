//! JSON transcoding: render yamlet values as JSON text.
//!
//! Mapping keys keep document order. Non-finite floats have no JSON form
//! and produce an error.

use libyamlet::{Scalar, Value};

/// Encode a yamlet Value as pretty-printed JSON.
pub fn encode(value: &Value) -> Result<String, String> {
    let json = value_to_json(value)?;
    serde_json::to_string_pretty(&json).map_err(|e| format!("JSON encode error: {}", e))
}

fn value_to_json(value: &Value) -> Result<serde_json::Value, String> {
    match value {
        Value::Scalar(scalar) => scalar_to_json(scalar),
        Value::Sequence(items) => {
            let items: Result<Vec<serde_json::Value>, String> =
                items.iter().map(value_to_json).collect();
            Ok(serde_json::Value::Array(items?))
        }
        Value::Mapping(map) => {
            let mut obj = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                obj.insert(k.clone(), value_to_json(v)?);
            }
            Ok(serde_json::Value::Object(obj))
        }
    }
}

fn scalar_to_json(scalar: &Scalar) -> Result<serde_json::Value, String> {
    match scalar {
        Scalar::Null => Ok(serde_json::Value::Null),
        Scalar::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Scalar::Integer(n) => Ok(serde_json::Value::from(*n)),
        Scalar::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| format!("JSON has no representation for {}", f)),
        Scalar::String(s) => Ok(serde_json::Value::String(s.clone())),
    }
}
