//! YAML transcoding: convert between yamlet values and full YAML text.
//!
//! Decoding accepts any YAML that `serde_yaml` reads (JSON included), which
//! lets `convert -f yaml` normalise flow collections and other syntax outside
//! the subset into a tree the subset emitter can write.
//!
//! Mapping from YAML to yamlet:
//!   - YAML null          -> Scalar::Null
//!   - YAML bool          -> Scalar::Bool
//!   - YAML integer       -> Scalar::Integer (error beyond i64)
//!   - YAML float         -> Scalar::Float
//!   - YAML string        -> Scalar::String
//!   - YAML sequence      -> Value::Sequence
//!   - YAML mapping       -> Value::Mapping (scalar keys rendered as text)
//!   - YAML tagged value  -> the untagged inner value

use libyamlet::{Mapping, Scalar, Value};

/// Decode a YAML string into a yamlet Value.
pub fn decode(input: &str) -> Result<Value, String> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(input).map_err(|e| format!("YAML parse error: {}", e))?;
    yaml_to_value(&yaml_value)
}

/// Encode a yamlet Value as a YAML string.
pub fn encode(value: &Value) -> Result<String, String> {
    serde_yaml::to_string(&value_to_yaml(value)).map_err(|e| format!("YAML encode error: {}", e))
}

fn yaml_to_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Scalar(Scalar::Null)),
        serde_yaml::Value::Bool(b) => Ok(Value::Scalar(Scalar::Bool(*b))),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Scalar(Scalar::Integer(i)))
            } else if n.is_u64() {
                Err(format!("YAML integer {} does not fit in 64 signed bits", n))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Scalar(Scalar::Float(f)))
            } else {
                Err(format!("Unsupported YAML number: {:?}", n))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::Scalar(Scalar::String(s.clone()))),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_value).collect();
            Ok(Value::Sequence(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = Mapping::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    _ => return Err(format!("Unsupported YAML mapping key: {:?}", k)),
                };
                obj.insert(key, yaml_to_value(v)?);
            }
            Ok(Value::Mapping(obj))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn value_to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Scalar(Scalar::Null) => serde_yaml::Value::Null,
        Value::Scalar(Scalar::Bool(b)) => serde_yaml::Value::Bool(*b),
        Value::Scalar(Scalar::Integer(n)) => serde_yaml::Value::Number((*n).into()),
        Value::Scalar(Scalar::Float(f)) => serde_yaml::Value::Number((*f).into()),
        Value::Scalar(Scalar::String(s)) => serde_yaml::Value::String(s.clone()),
        Value::Sequence(items) => {
            serde_yaml::Value::Sequence(items.iter().map(value_to_yaml).collect())
        }
        Value::Mapping(map) => serde_yaml::Value::Mapping(
            map.iter()
                .map(|(k, v)| (serde_yaml::Value::String(k.clone()), value_to_yaml(v)))
                .collect(),
        ),
    }
}
