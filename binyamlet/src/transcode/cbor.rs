//! CBOR transcoding: write yamlet values as CBOR and render CBOR as
//! diagnostic notation.
//!
//! Mapping from yamlet to CBOR:
//!   - Scalar::Null    -> CBOR null (simple value 22)
//!   - Scalar::Bool    -> CBOR bool (simple values 20/21)
//!   - Scalar::Integer -> CBOR integer (smallest encoding that fits)
//!   - Scalar::Float   -> CBOR float64 (always 9 bytes, never downgraded)
//!   - Scalar::String  -> CBOR text string
//!   - Value::Sequence -> CBOR array
//!   - Value::Mapping  -> CBOR map with text keys, in document order

use ciborium::value::Value as CborValue;
use libyamlet::{Scalar, Value};
use std::fmt::{self, Write as _};

// ---------------------------------------------------------------------------
// Encode
//
// Written by hand: ciborium's serializer shrinks float64 to float16/float32
// whenever the value survives the narrowing, and every float must stay
// float64 on the wire.
// ---------------------------------------------------------------------------

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

/// Encode a yamlet Value as CBOR bytes.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value);
    buf
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Scalar(scalar) => write_scalar(buf, scalar),
        Value::Sequence(items) => {
            write_head(buf, MAJOR_ARRAY, items.len() as u64);
            for item in items {
                write_value(buf, item);
            }
        }
        Value::Mapping(map) => {
            write_head(buf, MAJOR_MAP, map.len() as u64);
            for (k, v) in map {
                write_text(buf, k);
                write_value(buf, v);
            }
        }
    }
}

fn write_scalar(buf: &mut Vec<u8>, scalar: &Scalar) {
    match scalar {
        Scalar::Null => buf.push(0xf6),
        Scalar::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        // Major 1 carries -1 - n, which is the bitwise complement of n.
        Scalar::Integer(n) if *n < 0 => write_head(buf, MAJOR_NEGATIVE, !*n as u64),
        Scalar::Integer(n) => write_head(buf, MAJOR_UNSIGNED, *n as u64),
        Scalar::Float(f) => {
            buf.push(0xfb);
            buf.extend_from_slice(&f.to_be_bytes());
        }
        Scalar::String(s) => write_text(buf, s),
    }
}

fn write_text(buf: &mut Vec<u8>, s: &str) {
    write_head(buf, MAJOR_TEXT, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Write a major type with its argument in the shortest form.
fn write_head(buf: &mut Vec<u8>, major: u8, arg: u64) {
    let high = major << 5;
    if arg < 24 {
        buf.push(high | arg as u8);
    } else if let Ok(b) = u8::try_from(arg) {
        buf.extend_from_slice(&[high | 24, b]);
    } else if let Ok(h) = u16::try_from(arg) {
        buf.push(high | 25);
        buf.extend_from_slice(&h.to_be_bytes());
    } else if let Ok(w) = u32::try_from(arg) {
        buf.push(high | 26);
        buf.extend_from_slice(&w.to_be_bytes());
    } else {
        buf.push(high | 27);
        buf.extend_from_slice(&arg.to_be_bytes());
    }
}

// ---------------------------------------------------------------------------
// Diagnostic Notation (RFC 8949 §8)
// ---------------------------------------------------------------------------

/// Render CBOR bytes as diagnostic notation.
///
/// Works from the binary rather than from a yamlet Value so the output shows
/// the actual wire encoding.
pub fn diagnostic(input: &[u8]) -> Result<String, String> {
    let cbor: CborValue =
        ciborium::de::from_reader(input).map_err(|e| format!("CBOR decode error: {}", e))?;
    let mut out = String::new();
    Diag { out: &mut out }
        .value(&cbor, 0)
        .map_err(|e| format!("CBOR diagnostic error: {}", e))?;
    out.push('\n');
    Ok(out)
}

struct Diag<'a> {
    out: &'a mut String,
}

impl Diag<'_> {
    fn value(&mut self, val: &CborValue, indent: usize) -> fmt::Result {
        match val {
            CborValue::Null => self.out.push_str("null"),
            CborValue::Bool(b) => write!(self.out, "{}", b)?,
            CborValue::Integer(i) => write!(self.out, "{}", i128::from(*i))?,
            CborValue::Float(f) => self.float(*f)?,
            CborValue::Text(s) => self.text(s)?,
            CborValue::Bytes(bytes) => {
                self.out.push_str("h'");
                for byte in bytes {
                    write!(self.out, "{:02x}", byte)?;
                }
                self.out.push('\'');
            }
            CborValue::Array(items) => self.array(items, indent)?,
            CborValue::Map(pairs) => self.map(pairs, indent)?,
            CborValue::Tag(tag, inner) => {
                write!(self.out, "{}(", tag)?;
                self.value(inner, indent)?;
                self.out.push(')');
            }
            other => write!(self.out, "<?unknown {:?}>", other)?,
        }
        Ok(())
    }

    fn float(&mut self, f: f64) -> fmt::Result {
        if f.is_nan() {
            self.out.push_str("NaN");
        } else if f.is_infinite() {
            self.out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
        } else if f.fract() == 0.0 && f.abs() < 1e18 {
            // Covers -0.0 as well.
            write!(self.out, "{:.1}", f)?;
        } else {
            let s = f.to_string();
            self.out.push_str(&s);
            if !s.contains(['.', 'e', 'E']) {
                self.out.push_str(".0");
            }
        }
        Ok(())
    }

    fn text(&mut self, s: &str) -> fmt::Result {
        self.out.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if c.is_control() => write!(self.out, "\\u{:04x}", c as u32)?,
                c => self.out.push(c),
            }
        }
        self.out.push('"');
        Ok(())
    }

    fn array(&mut self, items: &[CborValue], indent: usize) -> fmt::Result {
        if items.is_empty() {
            self.out.push_str("[]");
            return Ok(());
        }
        // Short runs of scalars stay on one line.
        if items.len() <= 5 && items.iter().all(is_scalar) {
            self.out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(", ");
                }
                self.value(item, indent)?;
            }
            self.out.push(']');
            return Ok(());
        }
        self.out.push_str("[\n");
        let child = indent + 2;
        for (i, item) in items.iter().enumerate() {
            self.pad(child);
            self.value(item, child)?;
            self.separator(i, items.len());
        }
        self.pad(indent);
        self.out.push(']');
        Ok(())
    }

    fn map(&mut self, pairs: &[(CborValue, CborValue)], indent: usize) -> fmt::Result {
        if pairs.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        self.out.push_str("{\n");
        let child = indent + 2;
        for (i, (k, v)) in pairs.iter().enumerate() {
            self.pad(child);
            self.value(k, child)?;
            self.out.push_str(": ");
            self.value(v, child)?;
            self.separator(i, pairs.len());
        }
        self.pad(indent);
        self.out.push('}');
        Ok(())
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    fn separator(&mut self, index: usize, len: usize) {
        if index + 1 < len {
            self.out.push(',');
        }
        self.out.push('\n');
    }
}

fn is_scalar(val: &CborValue) -> bool {
    !matches!(
        val,
        CborValue::Array(_) | CborValue::Map(_) | CborValue::Tag(..)
    )
}
