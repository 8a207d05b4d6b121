use crate::diagnostics::error_codes::{EXPECTED_EXPRESSION, INVALID_COLOR, INVALID_NUMBER};
use crate::syntax::expression::{Expression, Unit};
use crate::syntax::precedence::{Precedence, prefix_op, rhs_precedence_for_infix, token_precedence};
use crate::syntax::token_type::TokenType;

use super::Parser;

impl Parser {
    pub(super) fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.is_peek_token(TokenType::Semicolon)
            && precedence < token_precedence(self.peek_token.token_type)
        {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let token = self.current_token.clone();
        match token.token_type {
            _ if Self::is_name_token(&token) => Some(Expression::Identifier {
                name: self.current_identifier(),
                span: token.span(),
            }),
            TokenType::Number => self.parse_number(),
            TokenType::String => Some(Expression::String {
                span: token.span(),
                value: token.literal,
            }),
            TokenType::True | TokenType::False => Some(Expression::Boolean {
                value: token.token_type == TokenType::True,
                span: token.span(),
            }),
            TokenType::Color => self.parse_color(),
            TokenType::At => self.parse_image_url(),
            TokenType::LParen => {
                self.next_token();
                let expression = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenType::RParen) {
                    return None;
                }
                Some(expression)
            }
            TokenType::LBracket => self.parse_array(),
            TokenType::LBrace => self.parse_struct_literal(),
            TokenType::Minus | TokenType::Bang => {
                let start = token.position;
                let precedence = prefix_op(token.token_type)
                    .map(|op| op.precedence)
                    .unwrap_or(Precedence::Prefix);
                self.next_token();
                let right = self.parse_expression(precedence)?;
                Some(Expression::Prefix {
                    operator: token.literal,
                    right: Box::new(right),
                    span: self.span_from(start),
                })
            }
            _ => {
                let found = if token.token_type == TokenType::Eof {
                    "end of file".to_string()
                } else {
                    token.literal.clone()
                };
                self.error(&EXPECTED_EXPRESSION, &[&found], token.span());
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let start = left.span().start;
        match self.current_token.token_type {
            TokenType::LParen => {
                let arguments = self.parse_expression_list(TokenType::RParen)?;
                Some(Expression::Call {
                    function: Box::new(left),
                    arguments,
                    span: self.span_from(start),
                })
            }
            TokenType::LBracket => {
                self.next_token();
                let index = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenType::RBracket) {
                    return None;
                }
                Some(Expression::Index {
                    left: Box::new(left),
                    index: Box::new(index),
                    span: self.span_from(start),
                })
            }
            TokenType::Dot => {
                let member = self.expect_peek_name_or_keyword()?;
                Some(Expression::Member {
                    object: Box::new(left),
                    member,
                    span: self.span_from(start),
                })
            }
            TokenType::Question => {
                self.next_token();
                let consequence = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenType::Colon) {
                    return None;
                }
                self.next_token();
                let alternative =
                    self.parse_expression(rhs_precedence_for_infix(TokenType::Question))?;
                Some(Expression::Conditional {
                    condition: Box::new(left),
                    consequence: Box::new(consequence),
                    alternative: Box::new(alternative),
                    span: self.span_from(start),
                })
            }
            _ => {
                let operator = self.current_token.literal.clone();
                let precedence = rhs_precedence_for_infix(self.current_token.token_type);
                self.next_token();
                let right = self.parse_expression(precedence)?;
                Some(Expression::Infix {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                    span: self.span_from(start),
                })
            }
        }
    }

    /// After `.`, any identifier-like token is a member name (`s.in`, `m.length`).
    fn expect_peek_name_or_keyword(&mut self) -> Option<crate::syntax::Identifier> {
        if self.peek_token.token_type.is_keyword() {
            self.next_token();
            return Some(self.current_identifier());
        }
        self.expect_peek_name()
    }

    /// Entered on the opening delimiter, returns on `end`. Trailing commas are allowed.
    fn parse_expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        while !self.is_peek_token(end) {
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
            if !self.is_peek_token(TokenType::Comma) {
                break;
            }
            self.next_token();
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_array(&mut self) -> Option<Expression> {
        let start = self.current_token.position;
        let elements = self.parse_expression_list(TokenType::RBracket)?;
        Some(Expression::Array {
            elements,
            span: self.span_from(start),
        })
    }

    /// `{ name: expr, ... }`
    fn parse_struct_literal(&mut self) -> Option<Expression> {
        let start = self.current_token.position;
        let mut fields = Vec::new();

        while !self.is_peek_token(TokenType::RBrace) {
            let name = self.expect_peek_name_or_keyword()?;
            if !self.expect_peek(TokenType::Colon) {
                return None;
            }
            self.next_token();
            fields.push((name, self.parse_expression(Precedence::Lowest)?));
            if !self.is_peek_token(TokenType::Comma) {
                break;
            }
            self.next_token();
        }

        if !self.expect_peek(TokenType::RBrace) {
            return None;
        }
        Some(Expression::StructLiteral {
            fields,
            span: self.span_from(start),
        })
    }

    /// `10px` → 10 with unit px.
    fn parse_number(&mut self) -> Option<Expression> {
        let literal = self.current_token.literal.clone();
        let span = self.current_token.span();
        let split = literal
            .find(|c: char| c.is_ascii_alphabetic() || c == '%')
            .unwrap_or(literal.len());
        let (digits, suffix) = literal.split_at(split);

        match (digits.parse::<f64>(), Unit::from_suffix(suffix)) {
            (Ok(value), Some(unit)) => Some(Expression::Number { value, unit, span }),
            _ => {
                self.error(&INVALID_NUMBER, &[&literal], span);
                None
            }
        }
    }

    /// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` → ARGB.
    fn parse_color(&mut self) -> Option<Expression> {
        let literal = self.current_token.literal.clone();
        let span = self.current_token.span();
        match parse_hex_color(&literal) {
            Some(argb) => Some(Expression::Color { argb, span }),
            None => {
                self.error(&INVALID_COLOR, &[&literal], span);
                None
            }
        }
    }

    /// `@image-url("path")`
    fn parse_image_url(&mut self) -> Option<Expression> {
        let start = self.current_token.position;
        let name = self.expect_peek_name()?;
        if name.as_str() != "image-url" {
            let span = name.span;
            self.error(&EXPECTED_EXPRESSION, &[&format!("@{}", name)], span);
            return None;
        }
        if !self.expect_peek(TokenType::LParen) || !self.expect_peek(TokenType::String) {
            return None;
        }
        let path = self.current_token.literal.clone();
        if !self.expect_peek(TokenType::RParen) {
            return None;
        }
        Some(Expression::ImageUrl {
            path,
            span: self.span_from(start),
        })
    }
}

pub(crate) fn parse_hex_color(literal: &str) -> Option<u32> {
    let digits = literal.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };
    let rgba = if expanded.len() == 6 {
        (u32::from_str_radix(&expanded, 16).ok()? << 8) | 0xff
    } else {
        u32::from_str_radix(&expanded, 16).ok()?
    };
    Some(rgba.rotate_right(8))
}

#[cfg(test)]
mod tests {
    use super::parse_hex_color;

    #[test]
    fn hex_colors_normalize_to_argb() {
        assert_eq!(parse_hex_color("#ff0000"), Some(0xffff0000));
        assert_eq!(parse_hex_color("#f00"), Some(0xffff0000));
        assert_eq!(parse_hex_color("#00ff0080"), Some(0x8000ff00));
        assert_eq!(parse_hex_color("#0f08"), Some(0x8800ff00));
    }

    #[test]
    fn malformed_colors_are_rejected() {
        assert_eq!(parse_hex_color("#12"), None);
        assert_eq!(parse_hex_color("#12zz12"), None);
        assert_eq!(parse_hex_color("ff0000"), None);
    }
}
