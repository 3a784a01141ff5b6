//! Scalar coercion.
//!
//! `coerce` turns a raw token into a typed [`Scalar`]. It never fails:
//! anything that is not recognized as null, a number, or a boolean stays a
//! string. The resolution order matters. Quote stripping runs first, so a
//! quoted `"true"` stays the string `true`; that is how documents force
//! string typing.
//!
//! `format_scalar` is the inverse used by the emitter.

use crate::value::Scalar;

/// Convert a raw token into a typed scalar.
pub fn coerce(raw: &str) -> Scalar {
    if raw.trim().is_empty() {
        return Scalar::Null;
    }

    if let Some(inner) = strip_quotes(raw) {
        return Scalar::String(inner.to_string());
    }

    if is_integer_literal(raw) {
        // Out-of-range integers stay strings rather than losing precision.
        return match raw.parse::<i64>() {
            Ok(n) => Scalar::Integer(n),
            Err(_) => Scalar::String(raw.to_string()),
        };
    }

    if is_float_literal(raw) {
        if let Ok(f) = raw.parse::<f64>() {
            return Scalar::Float(f);
        }
    }

    if raw.eq_ignore_ascii_case("true") {
        return Scalar::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Scalar::Bool(false);
    }

    if matches!(raw, "null" | "Null" | "NULL" | "~") {
        return Scalar::Null;
    }

    Scalar::String(raw.to_string())
}

/// Strip one matching pair of outer `"` or `'` quotes.
fn strip_quotes(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    if (first == b'"' || first == b'\'') && first == last {
        Some(&raw[1..raw.len() - 1])
    } else {
        None
    }
}

/// Drop a single leading minus sign.
fn digits_after_sign(s: &str) -> &str {
    s.strip_prefix('-').unwrap_or(s)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Matches `^-?\d+$`.
fn is_integer_literal(raw: &str) -> bool {
    all_digits(digits_after_sign(raw))
}

/// Matches `^-?\d+\.\d+$`.
fn is_float_literal(raw: &str) -> bool {
    match digits_after_sign(raw).split_once('.') {
        Some((whole, frac)) => all_digits(whole) && all_digits(frac),
        None => false,
    }
}

/// Format a scalar as it appears after `key: ` or `- ` in emitted text.
pub fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(true) => "true".to_string(),
        Scalar::Bool(false) => "false".to_string(),
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(f) => format_float(*f),
        Scalar::String(s) => {
            if needs_quotes(s) {
                quote_string(s)
            } else {
                s.clone()
            }
        }
    }
}

/// Format a scalar without quoting strings, for display and comparison.
pub fn scalar_to_plain_string(scalar: &Scalar) -> String {
    match scalar {
        Scalar::String(s) => s.clone(),
        other => format_scalar(other),
    }
}

/// Floats always carry a fractional part so they coerce back to floats.
/// Non-finite values have no literal in the subset and come back as strings.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            ".inf".to_string()
        } else {
            "-.inf".to_string()
        }
    } else {
        // Display for f64 never uses exponent notation.
        let s = format!("{}", f);
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    }
}

/// Whether a string must be quoted to survive a decode.
pub fn needs_quotes(s: &str) -> bool {
    if s.contains(':') || s.contains('"') || s.contains('\'') || s.contains('\n') {
        return true;
    }
    // `key: []` opens a sequence.
    if s == "[]" {
        return true;
    }
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    if ["true", "false", "null"]
        .iter()
        .any(|kw| s.eq_ignore_ascii_case(kw))
    {
        return true;
    }
    // Anything else that would not coerce back to the same string: "", "~", "-5".
    !matches!(coerce(s), Scalar::String(ref t) if t == s)
}

/// Quote a string for emission.
///
/// The decoder only strips the outer quote pair and does not process
/// escapes, so single quotes are preferred whenever they avoid escaping.
fn quote_string(s: &str) -> String {
    let s = s.replace('\n', "\\n");
    if s.contains('"') && !s.contains('\'') {
        format!("'{}'", s)
    } else {
        format!("\"{}\"", s.replace('"', "\\\""))
    }
}
