use std::fmt;

use crate::diagnostics::{Position, Span};

use super::token_type::TokenType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub position: Position,
    pub end_position: Position,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        literal: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        let literal = literal.into();
        let start = Position::new(line, column);
        let end = Position::new(line, column.saturating_add(literal.chars().count()));
        Self {
            token_type,
            literal,
            position: start,
            end_position: end,
        }
    }

    pub fn new_with_end(
        token_type: TokenType,
        literal: impl Into<String>,
        position: Position,
        end_position: Position,
    ) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            position,
            end_position,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.position, self.end_position)
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token({:?}, {:?}, {})",
            self.token_type, self.literal, self.position
        )
    }
}
