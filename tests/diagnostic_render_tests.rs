mod common;

use common::{codes, compile_err, with_no_color};
use vellum::diagnostics::{DiagnosticsAggregator, Severity, rendering::Colors};

const UNKNOWN_ELEMENT: &str = "export component A {\n    Gizmo {}\n}\n";

const TWO_ERRORS: &str = "export component A {\n    Gizmo {}\n    property <int> a: b;\n}\n";

#[test]
fn diagnostic_renders_header_location_snippet_and_hint() {
    let diagnostics = compile_err(UNKNOWN_ELEMENT);
    assert_eq!(codes(&diagnostics), vec!["E102"]);

    let rendered = diagnostics[0].render_with(Some(UNKNOWN_ELEMENT), None, &Colors::no_color());
    insta::assert_snapshot!(rendered, @r"
    --> error[E102]: UNKNOWN ELEMENT

    Unknown element type `Gizmo`.

      --> test.vel:2:5
      |
    2 |     Gizmo {}
      |     ^^^^^

    Hint:
      Declare the component earlier in the file or import it.
    ");
}

#[test]
fn display_is_a_single_line() {
    let diagnostics = compile_err(UNKNOWN_ELEMENT);
    assert_eq!(
        diagnostics[0].to_string(),
        "test.vel:2:5: error: Unknown element type `Gizmo`."
    );
}

#[test]
fn aggregated_report_counts_and_orders_by_line() {
    let diagnostics = compile_err(TWO_ERRORS);
    let report = DiagnosticsAggregator::new(&diagnostics)
        .with_default_source("test.vel", TWO_ERRORS)
        .report();

    assert_eq!(report.counts.errors, 2);
    assert_eq!(report.counts.warnings, 0);
    let _env = with_no_color(Some("1"));
    let rendered = DiagnosticsAggregator::new(&diagnostics)
        .with_default_source("test.vel", TWO_ERRORS)
        .render();
    assert!(rendered.starts_with("Found 2 errors.\n\ntest.vel\n--> error[E102]"));
    let second = rendered.find("error[E103]").expect("second error");
    assert!(rendered.find("error[E102]").is_some_and(|first| first < second));
    assert!(rendered.contains("3 |     property <int> a: b;"));
}

#[test]
fn error_limit_truncates_the_report() {
    let diagnostics = compile_err(TWO_ERRORS);
    let report = DiagnosticsAggregator::new(&diagnostics)
        .with_default_source("test.vel", TWO_ERRORS)
        .with_max_errors(Some(1))
        .report();
    assert_eq!(report.counts.errors, 2);
    assert!(!report.rendered.contains("E103"));
    assert!(report.rendered.ends_with("... and 1 more errors not shown.\n"));
}

#[test]
fn no_color_disables_escape_codes() {
    let diagnostics = compile_err(UNKNOWN_ELEMENT);
    {
        let _env = with_no_color(None);
        assert!(diagnostics[0].render(Some(UNKNOWN_ELEMENT), None).contains("\u{1b}[31m"));
    }
    {
        let _env = with_no_color(Some("1"));
        assert!(!diagnostics[0].render(Some(UNKNOWN_ELEMENT), None).contains('\u{1b}'));
    }
}

#[test]
fn warnings_do_not_block_the_build() {
    let mut compiler = common::compiler();
    assert!(compiler.build_from_source("component Lonely {}", "lonely.vel").is_some());
    let diagnostics = compiler.diagnostics();
    assert_eq!(diagnostics[0].severity(), Severity::Warning);
    assert!(!vellum::diagnostics::has_errors(diagnostics));
    assert!(diagnostics[0].render_with(None, None, &Colors::no_color()).starts_with(
        "--> warning[W001]: NO EXPORTED COMPONENT"
    ));
}

#[test]
fn diagnostics_serialize_for_tooling() {
    let diagnostics = compile_err(UNKNOWN_ELEMENT);
    let json = serde_json::to_value(&diagnostics[0]).unwrap();
    assert_eq!(json["severity"], "error");
    assert_eq!(json["code"], "E102");
    assert_eq!(json["file"], "test.vel");
    assert_eq!(json["title"], "UNKNOWN ELEMENT");
    assert_eq!(json["hints"][0], "Declare the component earlier in the file or import it.");
}
