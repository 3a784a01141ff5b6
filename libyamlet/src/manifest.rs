//! Manifest helpers built on the decoder.
//!
//! - Multi-document splitting on `---` lines.
//! - Carvel `Package` reference extraction (`spec.refName`, `spec.version`).
//! - Property consistency checks between a descriptor and applied manifests.

use crate::coerce::{format_scalar, scalar_to_plain_string};
use crate::error::Result;
use crate::options::DecodeOptions;
use crate::path::{get_segments, parse_path, PathError};
use crate::value::Value;
use crate::{decode_with_options, encode};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Error type for manifest extraction and property checks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManifestError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Property {path} not found in any document")]
    PropertyMissing { path: String },

    #[error("Property {path} in document {document} is {actual}, expected {expected}")]
    PropertyMismatch {
        path: String,
        /// Zero-based index of the offending document.
        document: usize,
        expected: String,
        actual: String,
    },

    #[error("Property {path} is a {found}, expected a scalar")]
    NotAScalar { path: String, found: &'static str },
}

/// Split source text into documents on lines consisting of `---`.
///
/// Trailing whitespace after the marker is allowed. Empty fragments are kept
/// so that document indices match the source.
pub fn split_documents(source: &str) -> Vec<&str> {
    let mut documents = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if content.starts_with("---") && content[3..].trim().is_empty() {
            documents.push(&source[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    documents.push(&source[start..]);
    documents
}

/// Whether a fragment holds anything besides blank lines and comments.
fn has_content(fragment: &str) -> bool {
    fragment.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    })
}

/// Decode every non-empty document of a multi-document source.
pub fn decode_documents(source: &str, options: &DecodeOptions) -> Result<Vec<Value>> {
    split_documents(source)
        .into_iter()
        .filter(|fragment| has_content(fragment))
        .map(|fragment| decode_with_options(fragment, options))
        .collect()
}

/// A Carvel package reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub ref_name: String,
    pub version: String,
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ref_name, self.version)
    }
}

/// Extract `spec.refName` and `spec.version` from a package document.
pub fn extract_package(doc: &Value) -> std::result::Result<PackageRef, ManifestError> {
    Ok(PackageRef {
        ref_name: scalar_property(doc, "spec.refName")?,
        version: scalar_property(doc, "spec.version")?,
    })
}

/// Find the first document that looks like a package and extract it.
pub fn find_package(docs: &[Value]) -> std::result::Result<PackageRef, ManifestError> {
    let doc = docs
        .iter()
        .find(|doc| doc.get("kind").and_then(Value::as_str) == Some("Package"))
        .or_else(|| docs.iter().find(|doc| doc.get_path("spec.refName").is_some()))
        .ok_or_else(|| ManifestError::PropertyMissing {
            path: "spec.refName".to_string(),
        })?;
    extract_package(doc)
}

/// Read a scalar property as plain text.
pub fn scalar_property(doc: &Value, path: &str) -> std::result::Result<String, ManifestError> {
    let segments = parse_path(path)?;
    match get_segments(doc, &segments) {
        Some(Value::Scalar(s)) => Ok(scalar_to_plain_string(s)),
        Some(other) => Err(ManifestError::NotAScalar {
            path: path.to_string(),
            found: other.kind(),
        }),
        None => Err(ManifestError::PropertyMissing {
            path: path.to_string(),
        }),
    }
}

/// Render a value for mismatch messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Scalar(s) => format_scalar(s),
        other => format!("{{{}}}", encode(other).replace('\n', "; ")),
    }
}

/// Check that every document containing `path` has exactly `expected` there.
pub fn check_property(
    docs: &[Value],
    path: &str,
    expected: &Value,
) -> std::result::Result<(), ManifestError> {
    check_property_with(docs, path, expected, |actual, expected| actual == expected)
}

/// Check a property with a custom comparison.
///
/// The predicate receives `(actual, expected)`. At least one document must
/// contain the path, and every document that does must satisfy the
/// predicate; the first failing document is reported.
pub fn check_property_with<F>(
    docs: &[Value],
    path: &str,
    expected: &Value,
    predicate: F,
) -> std::result::Result<(), ManifestError>
where
    F: Fn(&Value, &Value) -> bool,
{
    let segments = parse_path(path)?;
    let mut found = false;

    for (index, doc) in docs.iter().enumerate() {
        let Some(actual) = get_segments(doc, &segments) else {
            continue;
        };
        found = true;
        if !predicate(actual, expected) {
            return Err(ManifestError::PropertyMismatch {
                path: path.to_string(),
                document: index,
                expected: describe(expected),
                actual: describe(actual),
            });
        }
        debug!(path, document = index, "property matches");
    }

    if found {
        Ok(())
    } else {
        Err(ManifestError::PropertyMissing {
            path: path.to_string(),
        })
    }
}
