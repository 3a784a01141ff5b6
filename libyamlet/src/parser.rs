//! Phase 2: Tree Builder
//!
//! The builder walks classified lines in order and assembles the document
//! tree with an explicit indentation stack. Each frame owns the container
//! opened by a `key:` or `key: []` header; the top frame is the insertion
//! target, and the root mapping is the target when the stack is empty.
//! A frame is attached to its parent under its key when it is popped.
//!
//! Lines at an indent level less than or equal to a frame's level close that
//! frame, with one exception: a `- item` line at the same level as a
//! sequence header extends that sequence, so both of these produce
//! `{items: [a]}`:
//!
//! ```text
//! items:        items:
//!   - a         - a
//! ```

use crate::coerce::coerce;
use crate::error::{ParseContext, ParseError, Result};
use crate::options::DecodeOptions;
use crate::scanner::{ClassifiedLine, LineKind};
use crate::value::{Mapping, Value};
use tracing::{debug, trace};

/// A container under construction.
#[derive(Debug)]
enum Container {
    Mapping(Mapping),
    Sequence(Vec<Value>),
}

impl Container {
    fn into_value(self) -> Value {
        match self {
            Container::Mapping(map) => Value::Mapping(map),
            Container::Sequence(seq) => Value::Sequence(seq),
        }
    }
}

/// One entry of the indentation stack.
#[derive(Debug)]
struct Frame {
    key: String,
    container: Container,
    indent_level: usize,
}

impl Frame {
    /// A sequence, or a `key:` mapping that has not received any entry yet.
    fn accepts_items(&self) -> bool {
        match &self.container {
            Container::Sequence(_) => true,
            Container::Mapping(map) => map.is_empty(),
        }
    }
}

/// The current insertion target.
enum Target<'a> {
    Mapping(&'a mut Mapping),
    Sequence(&'a mut Vec<Value>),
}

fn target<'a>(root: &'a mut Mapping, stack: &'a mut [Frame]) -> Target<'a> {
    match stack.last_mut() {
        None => Target::Mapping(root),
        Some(frame) => match &mut frame.container {
            Container::Mapping(map) => Target::Mapping(map),
            Container::Sequence(seq) => Target::Sequence(seq),
        },
    }
}

/// Build a document tree from classified lines.
pub fn build_tree(
    lines: &[ClassifiedLine],
    options: &DecodeOptions,
    ctx: &ParseContext,
) -> Result<Value> {
    let mut root = Mapping::new();
    let mut stack: Vec<Frame> = Vec::new();

    for line in lines {
        unwind(&mut root, &mut stack, line);

        match line.kind {
            LineKind::KeyValue => insert_key_value(&mut root, &mut stack, line, options, ctx)?,
            LineKind::ArrayItem => push_item(&mut stack, line, options, ctx)?,
            LineKind::ObjectStart => {
                let container = Container::Mapping(Mapping::new());
                open_frame(&mut root, &mut stack, line, container, options, ctx)?
            }
            LineKind::ArrayStart => {
                let container = Container::Sequence(Vec::new());
                open_frame(&mut root, &mut stack, line, container, options, ctx)?
            }
        }
    }

    while let Some(frame) = stack.pop() {
        attach(&mut root, &mut stack, frame);
    }

    Ok(Value::Mapping(root))
}

/// Pop every frame the line does not belong to.
fn unwind(root: &mut Mapping, stack: &mut Vec<Frame>, line: &ClassifiedLine) {
    loop {
        let keep = match stack.last() {
            None => break,
            Some(top) => {
                top.indent_level < line.indent_level
                    || (line.kind == LineKind::ArrayItem
                        && top.indent_level == line.indent_level
                        && top.accepts_items())
            }
        };
        if keep {
            break;
        }
        if let Some(frame) = stack.pop() {
            trace!(key = %frame.key, level = frame.indent_level, "closing frame");
            attach(root, stack, frame);
        }
    }
}

/// Store a finished frame in its parent.
fn attach(root: &mut Mapping, stack: &mut [Frame], frame: Frame) {
    let value = frame.container.into_value();
    match target(root, stack) {
        Target::Mapping(map) => {
            map.insert(frame.key, value);
        }
        // Frames are only opened inside mappings.
        Target::Sequence(seq) => seq.push(value),
    }
}

fn value_of(line: &ClassifiedLine) -> Value {
    Value::Scalar(coerce(line.raw_value.as_deref().unwrap_or_default()))
}

fn key_of(line: &ClassifiedLine) -> &str {
    line.key.as_deref().unwrap_or_default()
}

fn insert_key_value(
    root: &mut Mapping,
    stack: &mut [Frame],
    line: &ClassifiedLine,
    options: &DecodeOptions,
    ctx: &ParseContext,
) -> Result<()> {
    let key = key_of(line);
    match target(root, stack) {
        Target::Mapping(map) => {
            map.insert(key.to_string(), value_of(line));
            Ok(())
        }
        Target::Sequence(_) => drop_key_in_sequence(line, key, options, ctx),
    }
}

fn push_item(
    stack: &mut [Frame],
    line: &ClassifiedLine,
    options: &DecodeOptions,
    ctx: &ParseContext,
) -> Result<()> {
    let Some(frame) = stack.last_mut().filter(|frame| frame.accepts_items()) else {
        if options.is_strict() {
            return Err(ParseError::orphan(ctx, line.line_num));
        }
        debug!(line = line.line_num, "dropping sequence item with no enclosing sequence");
        return Ok(());
    };

    // `key:` followed by items: the empty mapping becomes the sequence.
    if let Container::Mapping(_) = frame.container {
        trace!(key = %frame.key, "promoting header to sequence");
        frame.container = Container::Sequence(Vec::new());
    }
    if let Container::Sequence(seq) = &mut frame.container {
        seq.push(value_of(line));
    }
    Ok(())
}

fn open_frame(
    root: &mut Mapping,
    stack: &mut Vec<Frame>,
    line: &ClassifiedLine,
    container: Container,
    options: &DecodeOptions,
    ctx: &ParseContext,
) -> Result<()> {
    let key = key_of(line);
    if let Target::Sequence(_) = target(root, stack) {
        return drop_key_in_sequence(line, key, options, ctx);
    }
    trace!(key, level = line.indent_level, "opening frame");
    stack.push(Frame {
        key: key.to_string(),
        container,
        indent_level: line.indent_level,
    });
    Ok(())
}

fn drop_key_in_sequence(
    line: &ClassifiedLine,
    key: &str,
    options: &DecodeOptions,
    ctx: &ParseContext,
) -> Result<()> {
    if options.is_strict() {
        return Err(ParseError::key_in_sequence(ctx, line.line_num, key));
    }
    debug!(line = line.line_num, key, "dropping mapping key inside a sequence");
    Ok(())
}
