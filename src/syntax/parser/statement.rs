use crate::syntax::precedence::Precedence;
use crate::syntax::statement::{Block, Statement};
use crate::syntax::token_type::TokenType;

use super::Parser;

impl Parser {
    /// Entered on `{`, returns on the matching `}`.
    pub(super) fn parse_block(&mut self) -> Block {
        let start = self.current_token.position;
        let mut statements = Vec::new();
        self.next_token();

        while !self.is_current_token(TokenType::RBrace) && !self.is_current_token(TokenType::Eof)
        {
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => {
                    if self.synchronize() {
                        break;
                    }
                }
            }
            self.next_token();
        }

        if self.is_current_token(TokenType::Eof) {
            self.current_error("`}`");
        }

        Block {
            statements,
            span: self.span_from(start),
        }
    }

    pub(super) fn parse_statement(&mut self) -> Option<Statement> {
        match self.current_token.token_type {
            TokenType::If => self.parse_if_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::Semicolon => None,
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_if_statement(&mut self) -> Option<Statement> {
        let start = self.current_token.position;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let consequence = self.parse_block();

        let alternative = if self.is_peek_token(TokenType::Else) {
            self.next_token();
            if self.is_peek_token(TokenType::If) {
                // `else if` nests as a block holding a single if statement.
                self.next_token();
                let nested = self.parse_if_statement()?;
                let span = nested.span();
                Some(Block {
                    statements: vec![nested],
                    span,
                })
            } else {
                if !self.expect_peek(TokenType::LBrace) {
                    return None;
                }
                Some(self.parse_block())
            }
        } else {
            None
        };

        Some(Statement::If {
            condition,
            consequence,
            alternative,
            span: self.span_from(start),
        })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let start = self.current_token.position;
        let value = if self.is_peek_token(TokenType::Semicolon) || self.is_peek_token(TokenType::RBrace)
        {
            None
        } else {
            self.next_token();
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        if !self.expect_statement_end() {
            return None;
        }
        Some(Statement::Return {
            value,
            span: self.span_from(start),
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let start = self.current_token.position;
        let expression = self.parse_expression(Precedence::Lowest)?;

        let operator = match self.peek_token.token_type {
            TokenType::Assign => Some(""),
            TokenType::PlusAssign => Some("+"),
            TokenType::MinusAssign => Some("-"),
            TokenType::StarAssign => Some("*"),
            TokenType::SlashAssign => Some("/"),
            _ => None,
        };

        let statement = if let Some(operator) = operator {
            self.next_token();
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_statement_end() {
                return None;
            }
            Statement::Assign {
                target: expression,
                operator: operator.to_string(),
                value,
                span: self.span_from(start),
            }
        } else {
            if !self.expect_statement_end() {
                return None;
            }
            Statement::Expression {
                expression,
                span: self.span_from(start),
            }
        };
        Some(statement)
    }

    /// Consume the terminating `;`. The last statement of a block may omit it.
    fn expect_statement_end(&mut self) -> bool {
        if self.is_peek_token(TokenType::RBrace) {
            return true;
        }
        self.expect_peek(TokenType::Semicolon)
    }
}
