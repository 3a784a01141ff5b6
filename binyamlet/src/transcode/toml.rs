//! TOML transcoding: render yamlet values as TOML text.
//!
//! Mapping from yamlet to TOML:
//!   - Scalar::Null      -> error (TOML has no null)
//!   - Scalar::Bool      -> TOML boolean
//!   - Scalar::Integer   -> TOML integer
//!   - Scalar::Float     -> TOML float
//!   - Scalar::String    -> TOML string
//!   - Value::Sequence   -> TOML array (mappings inside become inline tables)
//!   - Value::Mapping    -> TOML table, keys in document order
//!
//! TOML requires the top-level value to be a table.

use libyamlet::{Mapping, Scalar, Value};
use toml_edit::{DocumentMut, Formatted, InlineTable, Item, Table};

/// Encode a yamlet Value as a TOML string.
pub fn encode(value: &Value) -> Result<String, String> {
    let Value::Mapping(map) = value else {
        return Err("TOML requires the top-level value to be a mapping".to_string());
    };
    let table = mapping_to_table(map)?;
    let mut doc = DocumentMut::new();
    for (key, item) in table.iter() {
        doc[key] = item.clone();
    }
    Ok(doc.to_string())
}

fn mapping_to_table(map: &Mapping) -> Result<Table, String> {
    let mut table = Table::new();
    for (k, v) in map {
        let item = match v {
            Value::Mapping(nested) => Item::Table(mapping_to_table(nested)?),
            other => Item::Value(value_to_toml(other)?),
        };
        table.insert(k, item);
    }
    Ok(table)
}

fn value_to_toml(value: &Value) -> Result<toml_edit::Value, String> {
    match value {
        Value::Scalar(Scalar::Null) => Err("TOML has no null type".to_string()),
        Value::Scalar(Scalar::Bool(b)) => Ok(toml_edit::Value::Boolean(Formatted::new(*b))),
        Value::Scalar(Scalar::Integer(n)) => Ok(toml_edit::Value::Integer(Formatted::new(*n))),
        Value::Scalar(Scalar::Float(f)) => Ok(toml_edit::Value::Float(Formatted::new(*f))),
        Value::Scalar(Scalar::String(s)) => {
            Ok(toml_edit::Value::String(Formatted::new(s.clone())))
        }
        Value::Sequence(items) => {
            let mut arr = toml_edit::Array::new();
            for item in items {
                arr.push(value_to_toml(item)?);
            }
            Ok(toml_edit::Value::Array(arr))
        }
        Value::Mapping(map) => {
            let mut inline = InlineTable::new();
            for (k, v) in map {
                inline.insert(k.as_str(), value_to_toml(v)?);
            }
            Ok(toml_edit::Value::InlineTable(inline))
        }
    }
}
