//! yamlet: a small YAML-subset parser and emitter.
//!
//! yamlet reads the block-style subset of YAML found in Kubernetes manifests
//! and Carvel packaging descriptors: nested `key: value` mappings, `key:`
//! headers, `- item` sequences, and `key: []`. It does not support anchors,
//! flow collections, block scalars, or multiple documents in one call
//! (see [`manifest::split_documents`]).
//!
//! # Decoding Pipeline
//!
//! 1. **Line Classifier**: Splits the source into lines and classifies each
//!    one as a mapping entry, a sequence item, or a container header.
//!
//! 2. **Value Coercer**: Turns raw scalar tokens into typed scalars.
//!
//! 3. **Tree Builder**: Assembles classified lines into a document tree with
//!    an explicit indentation stack.
//!
//! Encoding runs the other way through the **Tree Emitter**. Decoding then
//! encoding preserves the tree, not the text.
//!
//! Decoding is lenient by default: lines outside the subset are skipped and
//! logged through `tracing`. [`DecodeOptions::strict`] turns those cases into
//! [`ParseError`]s with line numbers.

mod coerce;
mod encode;
mod error;
pub mod manifest;
mod options;
mod parser;
pub mod path;
pub mod scanner;
mod value;

pub use coerce::{coerce, format_scalar, needs_quotes, scalar_to_plain_string};
pub use encode::{encode, encode_with_indent, try_encode, try_encode_with_indent};
pub use error::{EncodeError, ParseContext, ParseError, Result};
pub use manifest::{ManifestError, PackageRef};
pub use options::{DecodeOptions, Mode, DEFAULT_INDENT_UNIT};
pub use path::{PathError, PathSegment};
pub use scanner::{classify, ClassifiedLine, LineKind};
pub use value::{Mapping, Scalar, Value};

/// Decode a single YAML-subset document leniently.
///
/// # Example
///
/// ```
/// use libyamlet::decode;
///
/// let doc = decode("spec:\n  refName: argocd\n").unwrap();
/// assert_eq!(doc.get_path("spec.refName").and_then(|v| v.as_str()), Some("argocd"));
/// ```
pub fn decode(input: &str) -> Result<Value> {
    decode_with_options(input, &DecodeOptions::default())
}

/// Decode a single document with explicit options.
pub fn decode_with_options(input: &str, options: &DecodeOptions) -> Result<Value> {
    decode_lines(input.split('\n'), options)
}

/// Decode a document that has already been split into lines.
pub fn decode_lines<I, S>(lines: I, options: &DecodeOptions) -> Result<Value>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ctx = ParseContext::new(options.filename.as_deref());

    // Phase 1: Classify lines
    let classified = scanner::scan(lines, options, &ctx)?;

    // Phase 2: Build the tree
    parser::build_tree(&classified, options, &ctx)
}
