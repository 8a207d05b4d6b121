//! Recursive-descent parser for items and members, Pratt parser for expressions.
//!
//! Convention: every `parse_*` method is entered with `current_token` on the
//! first token of its construct and returns with `current_token` on the last
//! token it consumed. Callers advance past it.

use crate::diagnostics::Diagnostic;

use super::document::Document;
use super::lexer::Lexer;
use super::token::Token;
use super::token_type::TokenType;

mod expression;
mod helpers;
mod items;
mod statement;

pub(crate) use expression::parse_hex_color;

pub struct Parser {
    pub(super) lexer: Lexer,
    pub(super) current_token: Token,
    pub(super) peek_token: Token,
    pub(super) peek2_token: Token,
    pub(super) file: Option<String>,
    pub errors: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        let mut parser = Parser {
            lexer,
            current_token: Token::new(TokenType::Eof, "", 0, 0),
            peek_token: Token::new(TokenType::Eof, "", 0, 0),
            peek2_token: Token::new(TokenType::Eof, "", 0, 0),
            file: None,
            errors: Vec::new(),
        };
        parser.prime();
        parser
    }

    /// Attach a file name to every diagnostic this parser reports.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        let file = file.into();
        for diag in &mut self.errors {
            diag.file = Some(file.clone());
        }
        self.file = Some(file);
        self
    }

    fn prime(&mut self) {
        self.current_token = self.next_lexer_token();
        self.peek_token = self.next_lexer_token();
        self.peek2_token = self.next_lexer_token();
    }

    pub fn parse_document(&mut self) -> Document {
        let mut document = Document::default();

        while !self.is_current_token(TokenType::Eof) {
            match self.parse_item() {
                Some(item) => document.items.push(item),
                None => {
                    self.synchronize();
                }
            }
            self.next_token();
        }

        document
    }
}

#[cfg(test)]
mod parser_test;
