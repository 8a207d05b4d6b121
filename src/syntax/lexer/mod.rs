//! The `.vel` lexer - tokenizes source code into tokens

mod literals;
mod reader;

use crate::diagnostics::Position;

use super::token::Token;
use super::token_type::{TokenType, lookup_ident};

use reader::CharReader;

#[derive(Debug, Clone)]
pub struct Lexer {
    reader: CharReader,
    /// Position where an unterminated `/*` started
    unterminated_block_comment_pos: Option<Position>,
}

impl Lexer {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            reader: CharReader::new(input),
            unterminated_block_comment_pos: None,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_ignorable();

        if let Some(start) = self.unterminated_block_comment_pos.take() {
            return Token::new_with_end(
                TokenType::UnterminatedBlockComment,
                "/*",
                start,
                self.cursor_position(),
            );
        }

        let start = self.cursor_position();
        let (line, col) = (start.line, start.column);

        let Some(ch) = self.current_char() else {
            return Token::new(TokenType::Eof, "", line, col);
        };

        if is_letter(ch) {
            let ident = self.read_identifier();
            return Token::new(lookup_ident(&ident), ident, line, col);
        }
        if ch.is_ascii_digit() {
            return self.read_number();
        }
        match ch {
            '"' => return self.read_string(),
            '#' => return self.read_color(),
            _ => {}
        }

        let (token_type, width) = self.read_symbol(ch);
        let literal: String = if token_type == TokenType::Illegal {
            ch.to_string()
        } else {
            token_type.to_string()
        };
        for _ in 0..width {
            self.read_char();
        }
        Token::new_with_end(token_type, literal, start, self.cursor_position())
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.token_type == TokenType::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Longest-match operator lookup. Returns the token type and its width in chars.
    fn read_symbol(&self, ch: char) -> (TokenType, usize) {
        let next = self.peek_char();
        match (ch, next) {
            ('<', Some('=')) if self.peek_n(2) == Some('>') => (TokenType::TwoWay, 3),
            ('<', Some('=')) => (TokenType::Lte, 2),
            ('>', Some('=')) => (TokenType::Gte, 2),
            ('=', Some('=')) => (TokenType::Eq, 2),
            ('=', Some('>')) => (TokenType::FatArrow, 2),
            ('!', Some('=')) => (TokenType::NotEq, 2),
            ('&', Some('&')) => (TokenType::And, 2),
            ('|', Some('|')) => (TokenType::Or, 2),
            ('+', Some('=')) => (TokenType::PlusAssign, 2),
            ('-', Some('=')) => (TokenType::MinusAssign, 2),
            ('-', Some('>')) => (TokenType::Arrow, 2),
            ('*', Some('=')) => (TokenType::StarAssign, 2),
            ('/', Some('=')) => (TokenType::SlashAssign, 2),
            (':', Some('=')) => (TokenType::ColonAssign, 2),
            ('+', _) => (TokenType::Plus, 1),
            ('-', _) => (TokenType::Minus, 1),
            ('*', _) => (TokenType::Asterisk, 1),
            ('/', _) => (TokenType::Slash, 1),
            ('!', _) => (TokenType::Bang, 1),
            ('<', _) => (TokenType::Lt, 1),
            ('>', _) => (TokenType::Gt, 1),
            ('=', _) => (TokenType::Assign, 1),
            ('?', _) => (TokenType::Question, 1),
            ('(', _) => (TokenType::LParen, 1),
            (')', _) => (TokenType::RParen, 1),
            ('{', _) => (TokenType::LBrace, 1),
            ('}', _) => (TokenType::RBrace, 1),
            ('[', _) => (TokenType::LBracket, 1),
            (']', _) => (TokenType::RBracket, 1),
            (',', _) => (TokenType::Comma, 1),
            (';', _) => (TokenType::Semicolon, 1),
            (':', _) => (TokenType::Colon, 1),
            ('.', _) => (TokenType::Dot, 1),
            ('@', _) => (TokenType::At, 1),
            _ => (TokenType::Illegal, 1),
        }
    }

    /// Identifiers may contain `-` when it is directly followed by a letter,
    /// so `in-out` and `font-size` are single identifiers while `a - b` is not.
    fn read_identifier(&mut self) -> String {
        let start = self.reader.index();
        loop {
            self.reader.consume_identifier_continue_run();
            if self.current_char() == Some('-') && self.peek_char().is_some_and(is_letter) {
                self.read_char();
                continue;
            }
            break;
        }
        self.reader.slice(start, self.reader.index()).to_string()
    }

    fn skip_ignorable(&mut self) {
        loop {
            self.reader.skip_ascii_whitespace();

            if self.current_char() == Some('/') && self.peek_char() == Some('/') {
                self.reader.skip_line_comment_body();
                continue;
            }

            if self.current_char() == Some('/') && self.peek_char() == Some('*') {
                let comment_start = self.cursor_position();
                if !self.skip_block_comment() {
                    self.unterminated_block_comment_pos = Some(comment_start);
                    break;
                }
                continue;
            }

            break;
        }
    }

    /// Skip a nested block comment. Returns false if EOF was reached first.
    fn skip_block_comment(&mut self) -> bool {
        let mut nesting_depth = 0usize;

        while let Some(ch) = self.current_char() {
            if ch == '/' && self.peek_char() == Some('*') {
                self.read_char();
                self.read_char();
                nesting_depth += 1;
            } else if ch == '*' && self.peek_char() == Some('/') {
                self.read_char();
                self.read_char();
                nesting_depth -= 1;
                if nesting_depth == 0 {
                    return true;
                }
            } else {
                self.read_char();
            }
        }

        false
    }

    fn read_char(&mut self) {
        self.reader.advance();
    }

    fn current_char(&self) -> Option<char> {
        self.reader.current()
    }

    fn peek_char(&self) -> Option<char> {
        self.reader.peek()
    }

    fn peek_n(&self, n: usize) -> Option<char> {
        self.reader.peek_n(n)
    }

    fn cursor_position(&self) -> Position {
        self.reader.position()
    }
}

fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn dashed_identifiers_are_single_tokens() {
        let tokens = Lexer::new("font-size a - b in-out").tokenize();
        let literals: Vec<&str> = tokens.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(literals, vec!["font-size", "a", "-", "b", "in-out", ""]);
        assert_eq!(tokens[4].token_type, TokenType::InOut);
    }

    #[test]
    fn compound_operators_use_longest_match() {
        assert_eq!(
            types("<=> <= => -> += :="),
            vec![
                TokenType::TwoWay,
                TokenType::Lte,
                TokenType::FatArrow,
                TokenType::Arrow,
                TokenType::PlusAssign,
                TokenType::ColonAssign,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_nest() {
        assert_eq!(
            types("a // line\n /* outer /* inner */ still */ b"),
            vec![TokenType::Ident, TokenType::Ident, TokenType::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        assert_eq!(
            types("a /* never closed"),
            vec![
                TokenType::Ident,
                TokenType::UnterminatedBlockComment,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn token_positions_are_line_and_column() {
        let tokens = Lexer::new("x\n  y").tokenize();
        assert_eq!(tokens[1].position, Position::new(2, 2));
        assert_eq!(tokens[1].end_position, Position::new(2, 3));
    }

    #[test]
    fn unknown_character_is_illegal() {
        let tokens = Lexer::new("$").tokenize();
        assert_eq!(tokens[0].token_type, TokenType::Illegal);
        assert_eq!(tokens[0].literal, "$");
    }
}
