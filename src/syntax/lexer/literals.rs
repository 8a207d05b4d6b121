//! Number, string and color literals

use crate::syntax::token::Token;
use crate::syntax::token_type::TokenType;

use super::Lexer;

impl Lexer {
    /// Reads `12`, `1.5`, and unit-suffixed numbers such as `10px`, `250ms`,
    /// `50%`. The unit stays part of the literal; the parser splits it off.
    pub(super) fn read_number(&mut self) -> Token {
        let start_pos = self.cursor_position();
        let start = self.reader.index();

        self.reader.consume_decimal_run();

        if self.current_char() == Some('.') && self.peek_char().is_some_and(|c| c.is_ascii_digit())
        {
            self.read_char();
            self.reader.consume_decimal_run();
        }

        match self.current_char() {
            Some('%') => self.read_char(),
            Some(c) if c.is_ascii_alphabetic() => self.reader.consume_alpha_run(),
            _ => {}
        }

        let literal = self.reader.slice(start, self.reader.index()).to_string();
        Token::new_with_end(TokenType::Number, literal, start_pos, self.cursor_position())
    }

    /// `#` followed by an alphanumeric run. Validity of the digits is checked
    /// by the parser so that `#12zz` is reported as a bad color, not as junk.
    pub(super) fn read_color(&mut self) -> Token {
        let start_pos = self.cursor_position();
        let start = self.reader.index();

        self.read_char(); // '#'
        self.reader.consume_alphanumeric_run();

        let literal = self.reader.slice(start, self.reader.index()).to_string();
        Token::new_with_end(TokenType::Color, literal, start_pos, self.cursor_position())
    }

    /// Reads a double-quoted string, cooking escapes. The literal of the
    /// returned token is the string's value without quotes.
    pub(super) fn read_string(&mut self) -> Token {
        let start_pos = self.cursor_position();
        self.read_char(); // opening quote

        let mut value = String::new();
        let token_type = loop {
            match self.current_char() {
                None | Some('\n') => break TokenType::UnterminatedString,
                Some('"') => {
                    self.read_char();
                    break TokenType::String;
                }
                Some('\\') => {
                    self.read_char();
                    match self.current_char() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some(c) => value.push(c),
                        None => continue,
                    }
                    self.read_char();
                }
                Some(c) => {
                    value.push(c);
                    self.read_char();
                }
            }
        };

        Token::new_with_end(token_type, value, start_pos, self.cursor_position())
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::lexer::Lexer;
    use crate::syntax::token_type::TokenType;

    #[test]
    fn numbers_keep_their_unit_suffix() {
        let tokens = Lexer::new("10px 1.5 250ms 50% 3.").tokenize();
        let literals: Vec<&str> = tokens.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(literals, vec!["10px", "1.5", "250ms", "50%", "3", ".", ""]);
    }

    #[test]
    fn strings_cook_escapes() {
        let tokens = Lexer::new(r#""a\"b\nc""#).tokenize();
        assert_eq!(tokens[0].token_type, TokenType::String);
        assert_eq!(tokens[0].literal, "a\"b\nc");
    }

    #[test]
    fn string_broken_by_newline_is_unterminated() {
        let tokens = Lexer::new("\"abc\nx").tokenize();
        assert_eq!(tokens[0].token_type, TokenType::UnterminatedString);
        assert_eq!(tokens[1].literal, "x");
    }

    #[test]
    fn color_literal_includes_hash() {
        let tokens = Lexer::new("#ff00aa;").tokenize();
        assert_eq!(tokens[0].token_type, TokenType::Color);
        assert_eq!(tokens[0].literal, "#ff00aa");
        assert_eq!(tokens[1].token_type, TokenType::Semicolon);
    }
}
