//! Diagnostics module.
//!
//! Structured diagnostics with severity, error codes, source spans and
//! rendering helpers shared by the lexer, parser and compiler.

pub mod aggregator;
pub mod diagnostic;
pub mod error_codes;
pub mod format;
pub mod position;
pub mod rendering;
pub mod types;

pub use aggregator::{DEFAULT_MAX_ERRORS, DiagnosticCounts, DiagnosticsAggregator, DiagnosticsReport};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, render_diagnostics};
pub use error_codes::{ERROR_CODES, lookup_error_code};
pub use format::format_message;
pub use position::{Position, Span};
pub use types::{ErrorCode, Severity};

/// True when any diagnostic in `diagnostics` is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
