//! Decoder configuration.

/// Default number of spaces per indentation level.
pub const DEFAULT_INDENT_UNIT: usize = 2;

/// How the decoder reacts to input outside the supported subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Skip malformed lines, truncate odd indentation, drop orphan items.
    #[default]
    Lenient,
    /// Report the first problem as a [`crate::ParseError`].
    Strict,
}

/// Options for [`crate::decode_with_options`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub mode: Mode,
    pub indent_unit: usize,
    /// Used in error locations only.
    pub filename: Option<String>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Lenient,
            indent_unit: DEFAULT_INDENT_UNIT,
            filename: None,
        }
    }
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            mode: Mode::Strict,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// A unit of 0 is treated as 1.
    pub fn with_indent_unit(mut self, unit: usize) -> Self {
        self.indent_unit = unit.max(1);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_strict(&self) -> bool {
        self.mode == Mode::Strict
    }

    pub(crate) fn unit(&self) -> usize {
        self.indent_unit.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = DecodeOptions::default();
        assert_eq!(opts.mode, Mode::Lenient);
        assert_eq!(opts.indent_unit, 2);
        assert!(!opts.is_strict());
        assert!(DecodeOptions::strict().is_strict());
    }

    #[test]
    fn test_zero_unit_clamped() {
        assert_eq!(DecodeOptions::default().with_indent_unit(0).unit(), 1);
        let mut opts = DecodeOptions::default();
        opts.indent_unit = 0;
        assert_eq!(opts.unit(), 1);
    }
}
