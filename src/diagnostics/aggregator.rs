use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs;

use super::rendering::render_display_path;
use super::{Diagnostic, Severity};

/// Error limit used by the CLI.
pub const DEFAULT_MAX_ERRORS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagnosticCounts {
    pub errors: usize,
    pub warnings: usize,
}

impl DiagnosticCounts {
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }

    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
    }

    /// `Found 2 errors and 1 warning.`, or `None` for fewer than two entries.
    pub fn summary_line(&self) -> Option<String> {
        if self.total() < 2 {
            return None;
        }
        let parts: Vec<String> = [(self.errors, "error"), (self.warnings, "warning")]
            .into_iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, noun)| {
                let suffix = if count == 1 { "" } else { "s" };
                format!("{count} {noun}{suffix}")
            })
            .collect();
        Some(format!("Found {}.", parts.join(" and ")))
    }
}

#[derive(Debug, Clone)]
pub struct DiagnosticsReport {
    pub counts: DiagnosticCounts,
    pub rendered: String,
}

/// Deduplicates, orders and renders a batch of diagnostics, grouped by file.
///
/// Sources registered with [`with_source`](Self::with_source) are used for
/// snippets; any other file is read from disk on demand.
pub struct DiagnosticsAggregator<'a> {
    diagnostics: &'a [Diagnostic],
    max_errors: Option<usize>,
    default_file: Option<String>,
    sources: HashMap<String, String>,
}

/// Sort order: file, line, column, errors before warnings. Unlocated
/// diagnostics go last within their file.
type OrderKey<'d> = (&'d str, usize, usize, bool);

impl<'a> DiagnosticsAggregator<'a> {
    pub fn new(diagnostics: &'a [Diagnostic]) -> Self {
        Self {
            diagnostics,
            max_errors: None,
            default_file: None,
            sources: HashMap::new(),
        }
    }

    pub fn with_max_errors(mut self, max_errors: Option<usize>) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_source(mut self, file: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.insert(file.into(), source.into());
        self
    }

    /// Registers `source` and uses `file` for diagnostics that carry none.
    pub fn with_default_source(
        mut self,
        file: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let file = file.into();
        self.default_file = Some(file.clone());
        self.sources.insert(file, source.into());
        self
    }

    fn file_of<'d>(&'d self, diag: &'d Diagnostic) -> Option<&'d str> {
        diag.file()
            .filter(|file| !file.is_empty())
            .or_else(|| self.default_file.as_deref().filter(|file| !file.is_empty()))
    }

    fn order_key<'d>(&'d self, diag: &'d Diagnostic) -> OrderKey<'d> {
        let (line, column) = diag
            .position()
            .map_or((usize::MAX, usize::MAX), |pos| (pos.line, pos.column));
        (
            self.file_of(diag).unwrap_or(""),
            line,
            column,
            diag.severity() == Severity::Warning,
        )
    }

    fn unique(&self) -> Vec<&'a Diagnostic> {
        let mut seen = HashSet::new();
        let mut unique: Vec<&Diagnostic> = self
            .diagnostics
            .iter()
            .filter(|diag| {
                seen.insert((
                    self.file_of(diag).map(str::to_string),
                    diag.position().map(|pos| (pos.line, pos.column)),
                    diag.severity(),
                    diag.code().map(str::to_string),
                    diag.text().to_string(),
                ))
            })
            .collect();
        // Stable, so equal keys keep their reporting order.
        unique.sort_by(|a, b| self.order_key(a).cmp(&self.order_key(b)));
        unique
    }

    fn source_for(&self, file: Option<&str>, loaded: &mut HashMap<String, String>) -> Option<String> {
        let file = file?;
        if let Some(source) = self.sources.get(file) {
            return Some(source.clone());
        }
        if !loaded.contains_key(file) {
            let source = fs::read_to_string(file).ok()?;
            loaded.insert(file.to_string(), source);
        }
        loaded.get(file).cloned()
    }

    pub fn report(&self) -> DiagnosticsReport {
        let unique = self.unique();
        let mut counts = DiagnosticCounts::default();
        for diag in &unique {
            counts.record(diag.severity());
        }

        let limit = self.max_errors.unwrap_or(usize::MAX);
        let mut errors_shown = 0usize;
        let mut loaded = HashMap::new();
        let mut groups: Vec<(&str, Vec<String>)> = Vec::new();

        for diag in unique {
            if diag.is_error() {
                if errors_shown == limit {
                    continue;
                }
                errors_shown += 1;
            }

            let file = self.file_of(diag);
            let source = self.source_for(file, &mut loaded);
            let text = diag.render(source.as_deref(), self.default_file.as_deref());
            let key = file.unwrap_or("");
            match groups.last_mut() {
                Some((last, entries)) if *last == key => entries.push(text),
                _ => groups.push((key, vec![text])),
            }
        }

        let mut rendered = String::new();
        if let Some(summary) = counts.summary_line() {
            rendered.push_str(&summary);
            rendered.push_str("\n\n");
        }
        let blocks: Vec<String> = groups
            .into_iter()
            .map(|(file, entries)| format!("{}\n{}", display_name(file), entries.join("\n\n")))
            .collect();
        rendered.push_str(&blocks.join("\n\n"));

        let hidden = counts.errors - errors_shown;
        if hidden > 0 {
            if !rendered.ends_with('\n') {
                rendered.push('\n');
            }
            rendered.push_str(&format!("... and {hidden} more errors not shown.\n"));
        }

        DiagnosticsReport { counts, rendered }
    }

    pub fn render(&self) -> String {
        self.report().rendered
    }
}

fn display_name(file: &str) -> Cow<'_, str> {
    if file.is_empty() {
        Cow::Borrowed("<unknown>")
    } else {
        render_display_path(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_omitted_for_a_single_diagnostic() {
        let counts = DiagnosticCounts { errors: 1, warnings: 0 };
        assert_eq!(counts.summary_line(), None);
    }

    #[test]
    fn summary_pluralizes_each_part() {
        let counts = DiagnosticCounts { errors: 2, warnings: 1 };
        assert_eq!(
            counts.summary_line().as_deref(),
            Some("Found 2 errors and 1 warning.")
        );
    }

    #[test]
    fn identical_diagnostics_are_counted_once() {
        let diag = Diagnostic::error("UNKNOWN TYPE");
        let diags = vec![diag.clone(), diag];
        let report = DiagnosticsAggregator::new(&diags).report();
        assert_eq!(report.counts.errors, 1);
    }

    #[test]
    fn diagnostics_group_by_file_with_their_sources() {
        use crate::diagnostics::error_codes::UNKNOWN_ELEMENT;
        use crate::diagnostics::position::{Position, Span};

        let span = Span::new(Position::new(2, 4), Position::new(2, 9));
        let diags = vec![
            Diagnostic::make(&UNKNOWN_ELEMENT, &["Gizmo"], "b.vel", span),
            Diagnostic::make(&UNKNOWN_ELEMENT, &["Widget"], "a.vel", span),
        ];
        let report = DiagnosticsAggregator::new(&diags)
            .with_source("a.vel", "component A {\n    Widget {}\n}\n")
            .with_source("b.vel", "component B {\n    Gizmo {}\n}\n")
            .report();

        let a = report.rendered.find("`Widget`").unwrap();
        let b = report.rendered.find("`Gizmo`").unwrap();
        assert!(a < b);
        assert!(report.rendered.contains("2 |     Widget {}"));
        assert!(report.rendered.contains("2 |     Gizmo {}"));
    }
}
