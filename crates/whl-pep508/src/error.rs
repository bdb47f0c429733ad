use std::fmt::{Display, Formatter};
use std::ops::Range;

use unicode_width::UnicodeWidthStr;

/// A requirement or marker that doesn't follow the dependency specifier grammar.
///
/// Displays as the message, followed by the input with the offending part underlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
    span: Range<usize>,
    input: String,
}

impl ParseError {
    pub(crate) fn new(message: String, span: Range<usize>, input: &str) -> Self {
        Self {
            message,
            span,
            input: input.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The byte range of the input the error refers to. Empty at the end of the input.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Spans are in bytes, the underline in terminal columns.
        let start = self.span.start.min(self.input.len());
        let end = self.span.end.clamp(start, self.input.len());
        let indent = self.input[..start].width();
        let carets = self.input[start..end].width().max(1);
        write!(
            f,
            "{}\n{}\n{}{}",
            self.message,
            self.input,
            " ".repeat(indent),
            "^".repeat(carets)
        )
    }
}

impl std::error::Error for ParseError {}
