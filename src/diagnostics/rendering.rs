//! Rendering helpers for diagnostics.
//!
//! Layout of a rendered diagnostic:
//!
//! ```text
//! --> error[E101]: UNKNOWN TYPE
//!
//! Unknown type `size`.
//!
//!   --> ui/main.vel:2:15
//!   |
//! 2 |     property <size> width;
//!   |               ^^^^
//!
//! Hint:
//!   Known types: int, float, string, ...
//! ```

use std::borrow::Cow;
use std::env;

use super::Severity;
use super::position::Span;

pub struct Colors {
    pub yellow: &'static str,
    pub red: &'static str,
    pub cyan: &'static str,
    pub reset: &'static str,
}

impl Colors {
    pub fn with_color() -> Self {
        Self {
            yellow: "\u{1b}[33m",
            red: "\u{1b}[31m",
            cyan: "\u{1b}[36m",
            reset: "\u{1b}[0m",
        }
    }

    pub fn no_color() -> Self {
        Self {
            yellow: "",
            red: "",
            cyan: "",
            reset: "",
        }
    }

    /// Colors unless `NO_COLOR` is set.
    pub fn from_env() -> Self {
        if use_color() {
            Self::with_color()
        } else {
            Self::no_color()
        }
    }
}

pub fn use_color() -> bool {
    env::var_os("NO_COLOR").is_none()
}

/// `--> error[E101]: UNKNOWN TYPE`
pub fn render_header(out: &mut String, severity: Severity, title: &str, code: &str, colors: &Colors) {
    let color = match severity {
        Severity::Error => colors.red,
        Severity::Warning => colors.yellow,
    };
    out.push_str(color);
    out.push_str(&format!("--> {}[{}]: {}", severity.label(), code, title));
    out.push_str(colors.reset);
    out.push('\n');
}

pub fn render_message(out: &mut String, message: Option<&str>) {
    if let Some(message) = message
        && !message.is_empty()
    {
        out.push('\n');
        out.push_str(message);
        out.push('\n');
    }
}

/// `  --> file:line:column`, column displayed 1-based.
pub fn render_location(out: &mut String, file: &str, span: Span) {
    out.push('\n');
    out.push_str(&format!(
        "  --> {}:{}:{}\n",
        file,
        span.start.line,
        span.start.column + 1
    ));
}

/// Source lines covered by `span` with a caret underline per line.
pub fn render_source_snippet(out: &mut String, source: &str, span: Span, colors: &Colors) {
    let start_line = span.start.line;
    let end_line = span.end.line.max(start_line);
    let line_width = end_line.to_string().len();

    out.push_str(&format!("{:>width$} |\n", "", width = line_width));

    let mut printed_any = false;
    for line_no in start_line..=end_line {
        let Some(line_text) = get_source_line(source, line_no) else {
            continue;
        };
        if printed_any {
            out.push('\n');
        }
        printed_any = true;

        let line_len = line_text.chars().count();
        let (caret_start, caret_end) = if line_no == start_line && line_no == end_line {
            let start = span.start.column.min(line_len);
            let end = span.end.column.min(line_len).max(start + 1);
            (start, end)
        } else if line_no == start_line {
            let start = span.start.column.min(line_len);
            (start, line_len.max(start + 1))
        } else if line_no == end_line {
            (0, span.end.column.min(line_len).max(1))
        } else {
            (0, line_len.max(1))
        };

        out.push_str(&format!(
            "{:>width$} | {}\n",
            line_no,
            line_text,
            width = line_width
        ));
        out.push_str(&format!(
            "{:>width$} | {}",
            "",
            " ".repeat(caret_start),
            width = line_width
        ));
        out.push_str(colors.red);
        out.push_str(&"^".repeat(caret_end - caret_start));
        out.push_str(colors.reset);
    }
}

pub fn render_hints(out: &mut String, hints: &[String], colors: &Colors) {
    if hints.is_empty() {
        return;
    }
    out.push_str("\n\n");
    out.push_str(colors.cyan);
    out.push_str("Hint:");
    out.push_str(colors.reset);
    out.push('\n');
    for hint in hints {
        out.push_str(&format!("  {}\n", hint));
    }
}

/// Get a specific line from source code (1-indexed).
pub fn get_source_line(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }

    source.lines().nth(line - 1)
}

/// Format a file path for display, converting absolute paths to relative when possible
pub fn render_display_path(file: &str) -> Cow<'_, str> {
    let path = std::path::Path::new(file);
    if path.is_absolute()
        && let Ok(cwd) = env::current_dir()
        && let Ok(stripped) = path.strip_prefix(&cwd)
    {
        return Cow::Owned(stripped.to_string_lossy().to_string());
    }
    Cow::Borrowed(file)
}
