//! Property paths for navigating decoded documents.
//!
//! A path is a dot-separated list of keys with optional bracketed indices or
//! quoted keys: `spec.refName`, `spec.ports[0]`,
//! `metadata.labels["app.kubernetes.io/name"]`.

use crate::value::Value;
use thiserror::Error;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Error type for malformed property paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty property path")]
    Empty,

    #[error("Empty segment at offset {0} in property path")]
    EmptySegment(usize),

    #[error("Unclosed bracket at offset {0} in property path")]
    UnclosedBracket(usize),

    #[error("Invalid index {0:?} in property path")]
    InvalidIndex(String),

    #[error("Unexpected character {0:?} at offset {1} in property path")]
    UnexpectedChar(char, usize),
}

/// Parse a property path into segments.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;
    // Whether a segment must start at `i` (start of path or after a dot).
    let mut expect_key = true;

    while i < bytes.len() {
        match bytes[i] {
            b'[' => {
                let close = path[i..]
                    .find(']')
                    .map(|off| i + off)
                    .ok_or(PathError::UnclosedBracket(i))?;
                segments.push(parse_bracket(&path[i + 1..close])?);
                i = close + 1;
                expect_key = false;
            }
            b'.' => {
                if expect_key {
                    return Err(PathError::EmptySegment(i));
                }
                i += 1;
                expect_key = true;
                if i == bytes.len() {
                    return Err(PathError::EmptySegment(i));
                }
            }
            _ => {
                if !expect_key {
                    let c = path[i..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(PathError::UnexpectedChar(c, i));
                }
                let end = path[i..]
                    .find(['.', '['])
                    .map_or(path.len(), |off| i + off);
                segments.push(PathSegment::Key(path[i..end].to_string()));
                i = end;
                expect_key = false;
            }
        }
    }

    Ok(segments)
}

/// Parse the text between `[` and `]`.
fn parse_bracket(inner: &str) -> Result<PathSegment, PathError> {
    let quoted = inner.len() >= 2
        && ((inner.starts_with('"') && inner.ends_with('"'))
            || (inner.starts_with('\'') && inner.ends_with('\'')));
    if quoted {
        return Ok(PathSegment::Key(inner[1..inner.len() - 1].to_string()));
    }
    inner
        .parse::<usize>()
        .map(PathSegment::Index)
        .map_err(|_| PathError::InvalidIndex(inner.to_string()))
}

/// Follow already-parsed segments from `value`.
pub fn get_segments<'a>(value: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |current, segment| match segment {
        PathSegment::Key(key) => current.get(key),
        PathSegment::Index(index) => current.as_sequence().and_then(|seq| seq.get(*index)),
    })
}

impl Value {
    /// Look up a property path such as `spec.refName`.
    ///
    /// Returns `None` for malformed paths as well as missing properties; use
    /// [`parse_path`] to tell the two apart.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let segments = parse_path(path).ok()?;
        get_segments(self, &segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("spec.refName").unwrap(), vec![key("spec"), key("refName")]);
        assert_eq!(
            parse_path("spec.ports[1]").unwrap(),
            vec![key("spec"), key("ports"), PathSegment::Index(1)]
        );
        assert_eq!(
            parse_path("metadata.labels[\"app.kubernetes.io/name\"]").unwrap(),
            vec![key("metadata"), key("labels"), key("app.kubernetes.io/name")]
        );
        assert_eq!(
            parse_path("[0][1].x").unwrap(),
            vec![PathSegment::Index(0), PathSegment::Index(1), key("x")]
        );
    }

    #[test]
    fn test_parse_path_errors() {
        assert_eq!(parse_path(""), Err(PathError::Empty));
        assert_eq!(parse_path(".a"), Err(PathError::EmptySegment(0)));
        assert_eq!(parse_path("a..b"), Err(PathError::EmptySegment(2)));
        assert_eq!(parse_path("a."), Err(PathError::EmptySegment(2)));
        assert_eq!(parse_path("a[0"), Err(PathError::UnclosedBracket(1)));
        assert_eq!(parse_path("a[x]"), Err(PathError::InvalidIndex("x".into())));
        assert_eq!(parse_path("a[0]b"), Err(PathError::UnexpectedChar('b', 4)));
    }

    #[test]
    fn test_unexpected_char_is_whole_character() {
        assert_eq!(parse_path("a[0]é"), Err(PathError::UnexpectedChar('é', 4)));
        assert_eq!(
            parse_path("a[0]é").unwrap_err().to_string(),
            "Unexpected character 'é' at offset 4 in property path"
        );
    }

    #[test]
    fn test_get_path() {
        let doc = decode(
            "apiVersion: packaging.carvel.dev/v1alpha1\n\
             kind: Package\n\
             metadata:\n  \
               namespace: argocd\n\
             spec:\n  \
               refName: argocd-service.vsphere.vmware.com\n  \
               version: 1.0.0-24815986\n  \
               ports:\n    \
                 - 80\n    \
                 - 443",
        )
        .unwrap();
        assert_eq!(
            doc.get_path("spec.refName").and_then(Value::as_str),
            Some("argocd-service.vsphere.vmware.com")
        );
        assert_eq!(
            doc.get_path("spec.version").and_then(Value::as_str),
            Some("1.0.0-24815986")
        );
        assert_eq!(
            doc.get_path("metadata.namespace").and_then(Value::as_str),
            Some("argocd")
        );
        assert_eq!(doc.get_path("spec.ports[1]").and_then(Value::as_i64), Some(443));
        assert_eq!(doc.get_path("spec.ports[2]"), None);
        assert_eq!(doc.get_path("spec.refName.x"), None);
        assert_eq!(doc.get_path("spec..refName"), None);
    }
}
