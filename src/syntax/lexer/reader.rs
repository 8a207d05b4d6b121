//! Cursor over `.vel` source text.
//!
//! `offset` is always a char boundary in `source`; at end of input it equals
//! `source.len()`. Lines are 1-based, columns count chars from 0.

use crate::diagnostics::Position;

#[derive(Debug, Clone)]
pub(super) struct CharReader {
    source: String,
    offset: usize,
    line: usize,
    column: usize,
}

impl CharReader {
    pub(super) fn new(input: impl Into<String>) -> Self {
        Self {
            source: input.into(),
            offset: 0,
            line: 1,
            column: 0,
        }
    }

    fn rest(&self) -> &str {
        self.source.get(self.offset..).unwrap_or("")
    }

    pub(super) fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Steps past the current char and returns the new one.
    pub(super) fn advance(&mut self) -> Option<char> {
        if let Some(ch) = self.current() {
            self.step(ch);
        }
        self.current()
    }

    pub(super) fn peek(&self) -> Option<char> {
        self.peek_n(1)
    }

    /// The char `n` places after the current one. `peek_n(0)` is `None`.
    pub(super) fn peek_n(&self, n: usize) -> Option<char> {
        match n {
            0 => None,
            n => self.rest().chars().nth(n),
        }
    }

    fn step(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    fn eat_while(&mut self, mut keep: impl FnMut(char) -> bool) {
        while let Some(ch) = self.current() {
            if !keep(ch) {
                break;
            }
            self.step(ch);
        }
    }

    pub(super) fn consume_alphanumeric_run(&mut self) {
        self.eat_while(|c| c.is_ascii_alphanumeric());
    }

    pub(super) fn consume_decimal_run(&mut self) {
        self.eat_while(|c| c.is_ascii_digit());
    }

    pub(super) fn consume_alpha_run(&mut self) {
        self.eat_while(|c| c.is_ascii_alphabetic());
    }

    pub(super) fn consume_identifier_continue_run(&mut self) {
        self.eat_while(|c| c == '_' || c.is_ascii_alphanumeric());
    }

    pub(super) fn skip_ascii_whitespace(&mut self) {
        self.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    }

    pub(super) fn skip_line_comment_body(&mut self) {
        self.eat_while(|c| c != '\n');
    }

    /// Byte offset of the current char, for use with [`CharReader::slice`].
    pub(super) fn index(&self) -> usize {
        self.offset
    }

    pub(super) fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> &str {
        self.source.get(start..end).unwrap_or("")
    }
}
