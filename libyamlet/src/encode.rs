//! Phase 3: Tree Emitter
//!
//! Encodes a document tree back into YAML-subset text. The output decodes to
//! the same tree for anything the decoder can produce; comments, original
//! quoting, and spacing are not preserved.

use crate::coerce::format_scalar;
use crate::error::EncodeError;
use crate::options::DEFAULT_INDENT_UNIT;
use crate::value::{Mapping, Value};

/// Encode a value with the default indent unit of 2.
pub fn encode(value: &Value) -> String {
    encode_with_indent(value, DEFAULT_INDENT_UNIT)
}

/// Encode a value, indenting each level by `indent_unit` spaces.
///
/// Lines are joined with `\n` and there is no trailing newline. A mapping
/// root is the normal case; a sequence root is emitted as top-level items,
/// and a scalar root as its formatted text.
pub fn encode_with_indent(value: &Value, indent_unit: usize) -> String {
    let unit = indent_unit.max(1);
    let mut lines = Vec::new();
    match value {
        Value::Mapping(map) => encode_mapping(map, 0, unit, &mut lines),
        Value::Sequence(seq) => encode_sequence(seq, 0, unit, &mut lines),
        Value::Scalar(s) => lines.push(format_scalar(s)),
    }
    lines.join("\n")
}

/// Encode a document, refusing trees that would not decode back unchanged.
pub fn try_encode(value: &Value) -> Result<String, EncodeError> {
    try_encode_with_indent(value, DEFAULT_INDENT_UNIT)
}

/// [`try_encode`] with an explicit indent unit.
///
/// The root must be a mapping, every key must survive line classification,
/// and sequences may only hold scalars.
pub fn try_encode_with_indent(value: &Value, indent_unit: usize) -> Result<String, EncodeError> {
    match value {
        Value::Mapping(map) => check_mapping(map, "")?,
        other => return Err(EncodeError::RootNotMapping { found: other.kind() }),
    }
    Ok(encode_with_indent(value, indent_unit))
}

fn check_mapping(map: &Mapping, prefix: &str) -> Result<(), EncodeError> {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        if !is_plain_key(key) {
            return Err(EncodeError::UnrepresentableKey {
                key: key.clone(),
                path,
            });
        }
        match value {
            Value::Mapping(nested) => check_mapping(nested, &path)?,
            Value::Sequence(items) => {
                if let Some((index, item)) = items
                    .iter()
                    .enumerate()
                    .find(|(_, item)| !matches!(item, Value::Scalar(_)))
                {
                    return Err(EncodeError::ContainerInSequence {
                        path: format!("{}[{}]", path, index),
                        found: item.kind(),
                    });
                }
            }
            Value::Scalar(_) => {}
        }
    }
    Ok(())
}

/// Whether `key: ...` classifies back to the same key.
fn is_plain_key(key: &str) -> bool {
    !key.contains([':', '\n', '\r'])
        && !key.starts_with('#')
        && !key.starts_with("- ")
        && key.trim() == key
}

fn pad(depth: usize, unit: usize) -> String {
    " ".repeat(depth * unit)
}

fn encode_mapping(map: &Mapping, depth: usize, unit: usize, lines: &mut Vec<String>) {
    let pad = pad(depth, unit);
    for (key, value) in map {
        match value {
            Value::Scalar(s) => lines.push(format!("{}{}: {}", pad, key, format_scalar(s))),
            Value::Sequence(seq) if seq.is_empty() => lines.push(format!("{}{}: []", pad, key)),
            Value::Sequence(seq) => {
                lines.push(format!("{}{}:", pad, key));
                encode_sequence(seq, depth + 1, unit, lines);
            }
            Value::Mapping(nested) => {
                lines.push(format!("{}{}:", pad, key));
                encode_mapping(nested, depth + 1, unit, lines);
            }
        }
    }
}

fn encode_sequence(seq: &[Value], depth: usize, unit: usize, lines: &mut Vec<String>) {
    let pad = pad(depth, unit);
    for item in seq {
        match item {
            Value::Scalar(s) => lines.push(format!("{}- {}", pad, format_scalar(s))),
            // Containers inside sequences are outside the subset the decoder
            // reads back; emit them as a bare dash followed by their block.
            Value::Sequence(nested) => {
                lines.push(format!("{}-", pad));
                encode_sequence(nested, depth + 1, unit, lines);
            }
            Value::Mapping(nested) => {
                lines.push(format!("{}-", pad));
                encode_mapping(nested, depth + 1, unit, lines);
            }
        }
    }
}
