//! Front end for the `.vel` description language.

pub mod document;
pub mod expression;
pub mod lexer;
pub mod parser;
pub mod precedence;
pub mod statement;
pub mod token;
pub mod token_type;

use std::fmt;

use crate::diagnostics::{Diagnostic, Span};

pub use document::Document;
pub use lexer::Lexer;
pub use parser::Parser;

/// Canonical spelling of a name: `_` and `-` are interchangeable in `.vel`,
/// names are stored with `-`.
pub fn normalize_name(name: &str) -> String {
    name.replace('_', "-")
}

/// A name in source, normalized on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: &str, span: Span) -> Self {
        Self {
            name: normalize_name(name),
            span,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse `source`. Diagnostics carry `file` when one is given.
pub fn parse_document(source: &str, file: Option<&str>) -> (Document, Vec<Diagnostic>) {
    let mut parser = Parser::new(Lexer::new(source));
    if let Some(file) = file {
        parser = parser.with_file(file);
    }
    let document = parser.parse_document();
    (document, parser.errors)
}
