//! Phase 1: Line Classifier
//!
//! The classifier looks at one line at a time and decides its role:
//! - `key: value` is a mapping entry
//! - `key:` opens a nested mapping (or an implicit sequence)
//! - `key: []` opens a sequence
//! - `- value` is a sequence item
//!
//! Blank lines and whole-line `#` comments produce nothing. Inline comments
//! after a value are kept as part of the value.

use crate::error::{ParseContext, ParseError, Result};
use crate::options::{DecodeOptions, DEFAULT_INDENT_UNIT};
use tracing::{debug, trace};

/// Syntactic role of a classified line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `key: value`
    KeyValue,
    /// `- value`
    ArrayItem,
    /// `key:` with nothing after the colon.
    ObjectStart,
    /// `key: []`
    ArrayStart,
}

/// A single line after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    /// Present for every kind except `ArrayItem`.
    pub key: Option<String>,
    /// Present for `KeyValue` and `ArrayItem`.
    pub raw_value: Option<String>,
    /// Leading spaces divided by the indent unit.
    pub indent_level: usize,
    /// One-based line number, 0 when classified outside a document.
    pub line_num: usize,
}

/// Classify a line using the default indent unit of 2.
pub fn classify(line: &str) -> Option<ClassifiedLine> {
    classify_with_unit(line, DEFAULT_INDENT_UNIT)
}

/// Classify a line, computing its indent level with the given unit.
pub fn classify_with_unit(line: &str, unit: usize) -> Option<ClassifiedLine> {
    let line = line.trim_end();
    let indent_level = count_indent(line) / unit.max(1);
    let rest = line.trim_start();

    if rest.is_empty() || rest.starts_with('#') {
        return None;
    }

    if let Some(item) = rest.strip_prefix("- ") {
        return Some(ClassifiedLine {
            kind: LineKind::ArrayItem,
            key: None,
            raw_value: Some(item.trim().to_string()),
            indent_level,
            line_num: 0,
        });
    }

    let (key, raw_right) = rest.split_once(':')?;
    let key = key.trim().to_string();
    let raw_right = raw_right.trim();

    let (kind, raw_value) = match raw_right {
        "" => (LineKind::ObjectStart, None),
        "[]" => (LineKind::ArrayStart, None),
        value => (LineKind::KeyValue, Some(value.to_string())),
    };

    Some(ClassifiedLine {
        kind,
        key: Some(key),
        raw_value,
        indent_level,
        line_num: 0,
    })
}

/// Count the number of leading spaces in a line.
fn count_indent(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Classify every line of a document.
///
/// In lenient mode problems are logged and the offending line is skipped or
/// its indentation truncated. In strict mode the first problem is returned.
pub fn scan<I, S>(lines: I, options: &DecodeOptions, ctx: &ParseContext) -> Result<Vec<ClassifiedLine>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unit = options.unit();
    let mut out = Vec::new();

    for (index, raw) in lines.into_iter().enumerate() {
        let line_num = index + 1;
        let line = raw.as_ref().trim_end_matches('\r').trim_end();
        let rest = line.trim_start();

        if rest.is_empty() || rest.starts_with('#') {
            continue;
        }

        validate_indent(line, line_num, unit, options, ctx)?;

        match classify_with_unit(line, unit) {
            Some(mut classified) => {
                classified.line_num = line_num;
                trace!(
                    line = line_num,
                    kind = ?classified.kind,
                    indent = classified.indent_level,
                    "classified"
                );
                out.push(classified);
            }
            None => {
                if options.is_strict() {
                    return Err(ParseError::malformed(ctx, line_num, rest));
                }
                debug!(line = line_num, text = rest, "skipping unclassifiable line");
            }
        }
    }

    Ok(out)
}

/// Check leading whitespace for tabs and for a multiple of the indent unit.
fn validate_indent(
    line: &str,
    line_num: usize,
    unit: usize,
    options: &DecodeOptions,
    ctx: &ParseContext,
) -> Result<()> {
    let leading = &line[..line.len() - line.trim_start().len()];
    if leading.contains('\t') {
        if options.is_strict() {
            return Err(ParseError::tab(ctx, line_num));
        }
        debug!(line = line_num, "tab in indentation counts as zero width");
    }

    let spaces = count_indent(line);
    if spaces % unit != 0 {
        if options.is_strict() {
            return Err(ParseError::indentation(ctx, line_num, spaces, unit));
        }
        debug!(
            line = line_num,
            spaces,
            unit,
            "indentation is not a multiple of the unit, truncating"
        );
    }
    Ok(())
}
