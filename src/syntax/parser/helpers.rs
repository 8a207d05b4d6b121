use crate::diagnostics::error_codes::{
    INVALID_CHARACTER, UNEXPECTED_TOKEN, UNTERMINATED_COMMENT, UNTERMINATED_STRING,
};
use crate::diagnostics::{Diagnostic, ErrorCode, Position, Span};
use crate::syntax::Identifier;
use crate::syntax::token::Token;
use crate::syntax::token_type::TokenType;

use super::Parser;

impl Parser {
    // Token navigation
    pub(super) fn next_token(&mut self) {
        let next = self.next_lexer_token();
        self.current_token = std::mem::replace(
            &mut self.peek_token,
            std::mem::replace(&mut self.peek2_token, next),
        );
    }

    /// Pull the next token, reporting lexical errors as they stream past so
    /// the grammar never sees them.
    pub(super) fn next_lexer_token(&mut self) -> Token {
        loop {
            let token = self.lexer.next_token();
            match token.token_type {
                TokenType::Illegal => {
                    let literal = token.literal.clone();
                    self.error(&INVALID_CHARACTER, &[&literal], token.span());
                }
                TokenType::UnterminatedBlockComment => {
                    self.error(&UNTERMINATED_COMMENT, &[], token.span());
                }
                TokenType::UnterminatedString => {
                    self.error(&UNTERMINATED_STRING, &[], token.span());
                    return Token::new_with_end(
                        TokenType::String,
                        token.literal,
                        token.position,
                        token.end_position,
                    );
                }
                _ => return token,
            }
        }
    }

    pub(super) fn is_current_token(&self, token_type: TokenType) -> bool {
        self.current_token.token_type == token_type
    }

    pub(super) fn is_peek_token(&self, token_type: TokenType) -> bool {
        self.peek_token.token_type == token_type
    }

    pub(super) fn expect_peek(&mut self, token_type: TokenType) -> bool {
        if self.is_peek_token(token_type) {
            self.next_token();
            true
        } else {
            self.peek_error(&format!("`{}`", token_type));
            false
        }
    }

    /// Identifiers plus the keywords that may double as names.
    pub(super) fn is_name_token(token: &Token) -> bool {
        token.token_type == TokenType::Ident || token.token_type.is_contextual_keyword()
    }

    pub(super) fn expect_peek_name(&mut self) -> Option<Identifier> {
        if Self::is_name_token(&self.peek_token) {
            self.next_token();
            Some(self.current_identifier())
        } else {
            self.peek_error("a name");
            None
        }
    }

    pub(super) fn current_identifier(&self) -> Identifier {
        Identifier::new(&self.current_token.literal, self.current_token.span())
    }

    // Span/position utilities
    pub(super) fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.current_token.end_position)
    }

    // Error handling
    pub(super) fn error(&mut self, entry: &'static ErrorCode, values: &[&str], span: Span) {
        let file = self.file.clone().unwrap_or_default();
        self.errors.push(Diagnostic::make(entry, values, file, span));
    }

    pub(super) fn peek_error(&mut self, expected: &str) {
        let found = describe(&self.peek_token);
        let span = self.peek_token.span();
        self.error(&UNEXPECTED_TOKEN, &[expected, &found], span);
    }

    pub(super) fn current_error(&mut self, expected: &str) {
        let found = describe(&self.current_token);
        let span = self.current_token.span();
        self.error(&UNEXPECTED_TOKEN, &[expected, &found], span);
    }

    /// Skip to the end of a broken construct: a `;` or the `}` closing a
    /// block the construct opened. Returns true when it stopped on the `}`
    /// of the *enclosing* block, which the caller must not step over.
    pub(super) fn synchronize(&mut self) -> bool {
        let mut depth = 0usize;
        loop {
            match self.current_token.token_type {
                TokenType::Eof => return false,
                TokenType::LBrace => depth += 1,
                TokenType::RBrace if depth == 0 => return true,
                TokenType::RBrace if depth == 1 => return false,
                TokenType::RBrace => depth -= 1,
                TokenType::Semicolon if depth == 0 => return false,
                _ => {}
            }
            if depth == 0 && self.is_peek_token(TokenType::RBrace) {
                return false;
            }
            self.next_token();
        }
    }
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of file".to_string(),
        TokenType::String => format!("\"{}\"", token.literal),
        _ => token.literal.clone(),
    }
}
