use std::fmt;

macro_rules! define_tokens {
    (
        symbols { $($sym_name:ident => $sym_str:literal),* $(,)? }
        keywords { $($kw_name:ident => $kw_str:literal),* $(,)? }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum TokenType {
            // Special
            Illegal,
            Eof,

            // Identifiers & Literals
            Ident,
            Number,
            String,
            Color,
            UnterminatedString,
            UnterminatedBlockComment,

            // Symbols (operators & delimiters)
            $($sym_name,)*

            // Keywords (auto-generated from macro)
            $($kw_name,)*
        }

        impl fmt::Display for TokenType {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let s = match self {
                    TokenType::Illegal => "ILLEGAL",
                    TokenType::Eof => "end of file",
                    TokenType::Ident => "identifier",
                    TokenType::Number => "number",
                    TokenType::String => "string",
                    TokenType::Color => "color",
                    TokenType::UnterminatedString => "unterminated string",
                    TokenType::UnterminatedBlockComment => "unterminated comment",
                    $(TokenType::$sym_name => $sym_str,)*
                    $(TokenType::$kw_name => $kw_str,)*
                };
                write!(f, "{}", s)
            }
        }

        /// Called by the lexer to check if an identifier is a keyword
        pub fn lookup_ident(ident: &str) -> TokenType {
            match ident {
                $($kw_str => TokenType::$kw_name,)*
                _ => TokenType::Ident,
            }
        }

        impl TokenType {
            pub fn is_keyword(self) -> bool {
                matches!(self, $(TokenType::$kw_name)|*)
            }
        }
    };
}

define_tokens! {
    symbols {
        // Operators
        Plus     => "+",
        Minus    => "-",
        Asterisk => "*",
        Slash    => "/",
        Bang     => "!",
        Lt       => "<",
        Gt       => ">",
        Lte      => "<=",
        Gte      => ">=",
        Eq       => "==",
        NotEq    => "!=",
        And      => "&&",
        Or       => "||",
        Question => "?",

        // Assignment
        Assign      => "=",
        PlusAssign  => "+=",
        MinusAssign => "-=",
        StarAssign  => "*=",
        SlashAssign => "/=",
        ColonAssign => ":=",
        TwoWay      => "<=>",

        // Delimiters
        LParen    => "(",
        RParen    => ")",
        LBrace    => "{",
        RBrace    => "}",
        LBracket  => "[",
        RBracket  => "]",
        Comma     => ",",
        Semicolon => ";",
        Colon     => ":",
        Dot       => ".",
        At        => "@",
        Arrow     => "->",
        FatArrow  => "=>",
    }

    keywords {
        Import    => "import",
        Export    => "export",
        From      => "from",
        As        => "as",
        Component => "component",
        Struct    => "struct",
        Global    => "global",
        Inherits  => "inherits",
        Property  => "property",
        Callback  => "callback",
        In        => "in",
        Out       => "out",
        InOut     => "in-out",
        Private   => "private",
        For       => "for",
        If        => "if",
        Else      => "else",
        Return    => "return",
        True      => "true",
        False     => "false",
    }
}

impl TokenType {
    /// Keywords that may still name a property or element binding
    /// (`text: "from";`, `in: 3;` would otherwise be unusable).
    pub fn is_contextual_keyword(self) -> bool {
        matches!(
            self,
            TokenType::From | TokenType::As | TokenType::Inherits | TokenType::Global
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(lookup_ident("component"), TokenType::Component);
        assert_eq!(lookup_ident("in-out"), TokenType::InOut);
        assert_eq!(lookup_ident("counter"), TokenType::Ident);
    }

    #[test]
    fn display_uses_source_spelling_for_symbols() {
        assert_eq!(TokenType::FatArrow.to_string(), "=>");
        assert_eq!(TokenType::Eof.to_string(), "end of file");
    }
}
