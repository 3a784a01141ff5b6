//! Error types for yamlet decoding.

use thiserror::Error;

/// Result type for yamlet decoding operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse context carrying filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages. `line` is 1-based.
    pub fn loc_suffix(&self, line: usize) -> String {
        match &self.filename {
            Some(name) => format!(" at line {} of <{}>", line, name),
            None => format!(" at line {}", line),
        }
    }
}

/// Error type for strict-mode decoding.
///
/// Every variant carries the 1-based line number it was raised on and a
/// preformatted location suffix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A non-blank, non-comment line that is neither `key: value` nor `- item`.
    #[error("Malformed line {text:?}{loc}")]
    MalformedLine {
        line: usize,
        text: String,
        loc: String,
    },

    /// Leading whitespace is not a multiple of the indent unit.
    #[error("Indentation of {spaces} spaces is not a multiple of {unit}{loc}")]
    IndentationError {
        line: usize,
        spaces: usize,
        unit: usize,
        loc: String,
    },

    /// Tab character found in leading whitespace.
    #[error("Tab not allowed in indentation (use spaces){loc}")]
    TabIndentation { line: usize, loc: String },

    /// A `- item` line with no sequence to append to.
    #[error("Sequence item has no enclosing sequence{loc}")]
    OrphanSequenceItem { line: usize, loc: String },

    /// A mapping entry whose insertion target is a sequence.
    #[error("Mapping key {key:?} inside a sequence{loc}")]
    KeyInSequence {
        line: usize,
        key: String,
        loc: String,
    },
}

impl ParseError {
    /// The 1-based source line the error was raised on.
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedLine { line, .. }
            | ParseError::IndentationError { line, .. }
            | ParseError::TabIndentation { line, .. }
            | ParseError::OrphanSequenceItem { line, .. }
            | ParseError::KeyInSequence { line, .. } => *line,
        }
    }

    pub(crate) fn malformed(ctx: &ParseContext, line: usize, text: &str) -> Self {
        ParseError::MalformedLine {
            line,
            text: text.to_string(),
            loc: ctx.loc_suffix(line),
        }
    }

    pub(crate) fn indentation(ctx: &ParseContext, line: usize, spaces: usize, unit: usize) -> Self {
        ParseError::IndentationError {
            line,
            spaces,
            unit,
            loc: ctx.loc_suffix(line),
        }
    }

    pub(crate) fn tab(ctx: &ParseContext, line: usize) -> Self {
        ParseError::TabIndentation {
            line,
            loc: ctx.loc_suffix(line),
        }
    }

    pub(crate) fn orphan(ctx: &ParseContext, line: usize) -> Self {
        ParseError::OrphanSequenceItem {
            line,
            loc: ctx.loc_suffix(line),
        }
    }

    pub(crate) fn key_in_sequence(ctx: &ParseContext, line: usize, key: &str) -> Self {
        ParseError::KeyInSequence {
            line,
            key: key.to_string(),
            loc: ctx.loc_suffix(line),
        }
    }
}

/// Error type for [`crate::try_encode`]: trees that subset text cannot hold.
///
/// `path` names the offending node, e.g. `spec.containers[0]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Only a mapping can be the root of a document.
    #[error("Cannot encode a {found} as a document; the root must be a mapping")]
    RootNotMapping { found: &'static str },

    /// A key the decoder would split, skip, or trim.
    #[error("Mapping key {key:?} at {path} cannot be written as subset text")]
    UnrepresentableKey { key: String, path: String },

    /// Sequence items must be scalars.
    #[error("Sequence item at {path} is a {found}; only scalars can be sequence items")]
    ContainerInSequence { path: String, found: &'static str },
}
