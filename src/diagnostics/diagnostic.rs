use serde::Serialize;

use super::format::format_message;
use super::position::{Position, Span};
use super::rendering::{
    Colors, render_display_path, render_header, render_hints, render_location, render_message,
    render_source_snippet,
};
use super::{ErrorCode, Severity};

/// A single compiler message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub(crate) severity: Severity,
    pub(crate) title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) span: Option<Span>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) hints: Vec<String>,
}

/// Fluent construction API, implemented by [`Diagnostic`].
pub trait DiagnosticBuilder: Sized {
    fn with_code(self, code: impl Into<String>) -> Self;
    fn with_message(self, message: impl Into<String>) -> Self;
    fn with_file(self, file: impl Into<String>) -> Self;
    fn with_span(self, span: Span) -> Self;
    fn with_hint(self, hint: impl Into<String>) -> Self;

    fn with_position(self, position: Position) -> Self {
        self.with_span(Span::point(position))
    }
}

impl DiagnosticBuilder for Diagnostic {
    fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl Diagnostic {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            code: None,
            message: None,
            file: None,
            span: None,
            hints: Vec::new(),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(Severity::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title)
    }

    /// Build a diagnostic from a static [`ErrorCode`] entry, filling the
    /// message and hint templates with `values`.
    pub fn make(
        entry: &'static ErrorCode,
        values: &[&str],
        file: impl Into<String>,
        span: Span,
    ) -> Self {
        let mut diag = Diagnostic::new(entry.severity, entry.title)
            .with_code(entry.code)
            .with_file(file)
            .with_span(span)
            .with_message(format_message(entry.message, values));

        if let Some(hint) = entry.hint {
            diag = diag.with_hint(format_message(hint, values));
        }

        diag
    }

    /// Like [`Diagnostic::make`], for problems with a whole file or with no
    /// file at all.
    pub fn make_unlocated(entry: &'static ErrorCode, values: &[&str], file: Option<&str>) -> Self {
        let mut diag = Diagnostic::new(entry.severity, entry.title)
            .with_code(entry.code)
            .with_message(format_message(entry.message, values));
        if let Some(file) = file {
            diag = diag.with_file(file);
        }
        if let Some(hint) = entry.hint {
            diag = diag.with_hint(format_message(hint, values));
        }
        diag
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The message if there is one, otherwise the title.
    pub fn text(&self) -> &str {
        self.message().unwrap_or(&self.title)
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn position(&self) -> Option<Position> {
        self.span.map(|span| span.start)
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Render with colors controlled by `NO_COLOR`.
    pub fn render(&self, source: Option<&str>, default_file: Option<&str>) -> String {
        self.render_with(source, default_file, &Colors::from_env())
    }

    pub fn render_with(
        &self,
        source: Option<&str>,
        default_file: Option<&str>,
        colors: &Colors,
    ) -> String {
        let mut out = String::new();
        let file = self
            .file
            .as_deref()
            .filter(|f| !f.is_empty())
            .or(default_file)
            .map(render_display_path)
            .map(|f| f.into_owned())
            .unwrap_or_else(|| "<unknown>".to_string());
        let code = self.code.as_deref().unwrap_or("E000");

        render_header(&mut out, self.severity, &self.title, code, colors);
        render_message(&mut out, self.message.as_deref());

        if let Some(span) = self.span {
            render_location(&mut out, &file, span);
            if let Some(source) = source {
                render_source_snippet(&mut out, source, span, colors);
            }
        }

        render_hints(&mut out, &self.hints, colors);
        out
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.file(), self.position()) {
            (Some(file), Some(pos)) => write!(f, "{}:{}: ", file, pos)?,
            (None, Some(pos)) => write!(f, "{}: ", pos)?,
            _ => {}
        }
        write!(f, "{}: {}", self.severity.label(), self.text())
    }
}

pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    source: Option<&str>,
    default_file: Option<&str>,
) -> String {
    diagnostics
        .iter()
        .map(|diag| diag.render(source, default_file))
        .collect::<Vec<_>>()
        .join("\n\n")
}
