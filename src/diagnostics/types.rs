//! Core diagnostic types: severity levels and static error code entries.

use serde::Serialize;

/// Severity level of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Prevents a definition from being produced
    Error,
    /// Reported, but the build still succeeds
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Error code with message template and optional hint.
///
/// `message` and `hint` use positional `{}` placeholders filled by
/// [`format_message`](super::format_message).
#[derive(Debug, Clone, Copy)]
pub struct ErrorCode {
    pub code: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    pub hint: Option<&'static str>,
}
