use std::ops::Range;

use crate::ParseError;

/// A read position in the string being parsed.
#[derive(Debug)]
pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// The byte offset of the next character.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// The input that hasn't been consumed yet.
    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let char = self.peek()?;
        self.pos += char.len_utf8();
        Some(char)
    }

    pub(crate) fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Consume `literal` if the input continues with it.
    pub(crate) fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume `keyword` if the input continues with it as a whole word, e.g. `in` but not the
    /// start of `input`.
    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.rest().strip_prefix(keyword) {
            Some(after) if !after.starts_with(is_name_char) => {
                self.pos += keyword.len();
                true
            }
            _ => false,
        }
    }

    /// Consume the longest run of characters matching `predicate`, returning its span and text.
    pub(crate) fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> (Range<usize>, &'a str) {
        let rest = self.rest();
        let len = rest.find(|char| !predicate(char)).unwrap_or(rest.len());
        let start = self.pos;
        self.pos += len;
        (start..self.pos, &rest[..len])
    }

    pub(crate) fn error(&self, message: impl Into<String>, span: Range<usize>) -> ParseError {
        ParseError::new(message.into(), span, self.input)
    }

    /// An error pointing at the next character, which isn't `what` the grammar asks for.
    pub(crate) fn expected(&self, what: &str) -> ParseError {
        match self.peek() {
            Some(char) => self.error(
                format!("Expected {what}, found `{char}`"),
                self.pos..self.pos + char.len_utf8(),
            ),
            None => self.error(
                format!("Expected {what}, found end of input"),
                self.pos..self.pos,
            ),
        }
    }
}

/// A character that may appear in a package name, an extra name or a marker variable.
pub(crate) fn is_name_char(char: char) -> bool {
    char.is_ascii_alphanumeric() || matches!(char, '-' | '_' | '.')
}
