mod common;

use common::{codes, compile, compile_err, compiler, temp_root, write_file};
use vellum::{
    ComponentCompiler, CompilerConfiguration, Value,
    diagnostics::Severity,
};

#[test]
fn exported_component_compiles_without_diagnostics() {
    let mut compiler = compiler();
    let definition = compiler
        .build_from_source(
            "export component Hello inherits Window {\n    title: \"Hi\";\n}\n",
            "hello.vel",
        )
        .expect("definition");
    assert_eq!(definition.name(), "Hello");
    assert!(compiler.diagnostics().is_empty());
}

#[test]
fn last_exported_component_is_the_main_one() {
    let definition = compile(
        "export component First {}\nexport component Second {}\ncomponent Third {}\n",
    );
    assert_eq!(definition.name(), "Second");
}

#[test]
fn missing_export_warns_and_uses_the_last_component() {
    let mut compiler = compiler();
    let definition = compiler.build_from_source("component Lonely {}\n", "lonely.vel");
    assert_eq!(definition.map(|d| d.name().to_string()).as_deref(), Some("Lonely"));

    let diagnostics = compiler.diagnostics();
    assert_eq!(codes(diagnostics), vec!["W001"]);
    assert_eq!(diagnostics[0].severity(), Severity::Warning);
}

#[test]
fn document_without_component_fails() {
    let diagnostics = compile_err("export struct Point { x: int, y: int }\n");
    assert_eq!(codes(&diagnostics), vec!["E131"]);
}

#[test]
fn syntax_errors_are_reported() {
    let diagnostics = compile_err("export component { }\n");
    assert!(codes(&diagnostics).contains(&"E001".to_string()));
}

#[test]
fn semantic_errors_carry_their_codes() {
    let cases = [
        ("export component A { in property <size> w; }", "E101"),
        ("export component A { property <int> a; property <int> a; }", "E100"),
        ("export component A { Gizmo {} }", "E102"),
        ("export component A { property <int> a: b; }", "E103"),
        ("export component A { callback f; f: 1; }", "E104"),
        ("export component A { property <int> a: \"x\"; }", "E105"),
        ("export component A { callback f(int); f(a, b) => {} }", "E106"),
        ("export component A { property <int> a; a => {} }", "E107"),
        ("export component A { callback f(int); callback g; g => { f(); } }", "E108"),
        ("export component A { A {} }", "E111"),
        ("export component A { property <bool> a: true - 1; }", "E112"),
    ];
    for (source, code) in cases {
        let diagnostics = compile_err(source);
        assert!(
            codes(&diagnostics).contains(&code.to_string()),
            "{}: expected {}, got {:?}",
            source,
            code,
            codes(&diagnostics)
        );
    }
}

#[test]
fn diagnostics_reset_between_builds() {
    let mut compiler = compiler();
    assert!(compiler.build_from_source("export component A { Gizmo {} }", "a.vel").is_none());
    assert!(!compiler.diagnostics().is_empty());

    assert!(compiler.build_from_source("export component A {}", "a.vel").is_some());
    assert!(compiler.diagnostics().is_empty());
}

#[test]
fn definitions_outlive_their_compiler() {
    let definition = {
        let mut compiler = compiler();
        compiler
            .build_from_source("export component A { in-out property <int> n: 4; }", "a.vel")
            .expect("definition")
    };
    let instance = definition.create();
    assert_eq!(instance.get_property("n"), Some(Value::from(4)));
}

#[test]
fn relative_imports_resolve_next_to_the_importer() {
    let root = temp_root("relative_import");
    write_file(
        &root.join("widgets/badge.vel"),
        "export component Badge inherits Text {\n    in property <string> label;\n    text: \"[\" + label + \"]\";\n}\n",
    );
    let main = root.join("main.vel");
    write_file(
        &main,
        "import { Badge } from \"widgets/badge.vel\";\n\
         export component Main {\n    b := Badge { label: \"new\"; }\n    out property <string> shown: b.text;\n}\n",
    );

    let mut compiler = compiler();
    let definition = compiler.build_from_path(&main).expect("definition");
    assert_eq!(definition.source_path(), Some(main.as_path()));
    let instance = definition.create();
    assert_eq!(instance.get_property("shown"), Some(Value::from("[new]")));
}

#[test]
fn include_paths_are_searched_after_the_importing_directory() {
    let lib = temp_root("include_lib");
    write_file(
        &lib.join("theme.vel"),
        "export global Theme {\n    out property <length> gap: 8px;\n}\n",
    );
    let app = temp_root("include_app");
    let main = app.join("main.vel");
    write_file(
        &main,
        "import { Theme } from \"theme.vel\";\nexport component Main {\n    out property <length> gap: Theme.gap * 2;\n}\n",
    );

    let mut compiler = compiler();
    assert!(compiler.build_from_path(&main).is_none());
    assert!(codes(compiler.diagnostics()).contains(&"E120".to_string()));

    compiler.set_include_paths(vec![lib.clone()]);
    let definition = compiler.build_from_path(&main).expect("definition");
    let instance = definition.create();
    assert_eq!(instance.get_property("gap"), Some(Value::from(16)));
}

#[test]
fn import_errors() {
    let root = temp_root("import_errors");
    write_file(&root.join("a.vel"), "import { B } from \"b.vel\";\nexport component A {}\n");
    write_file(&root.join("b.vel"), "import { A } from \"a.vel\";\nexport component B {}\n");
    write_file(&root.join("lib.vel"), "export component Real {}\n");
    write_file(
        &root.join("unknown.vel"),
        "import { Fake } from \"lib.vel\";\nexport component Main {}\n",
    );

    let mut compiler = compiler();
    assert!(compiler.build_from_path(root.join("a.vel")).is_none());
    assert!(codes(compiler.diagnostics()).contains(&"E121".to_string()));

    assert!(compiler.build_from_path(root.join("unknown.vel")).is_none());
    assert_eq!(codes(compiler.diagnostics()), vec!["E122"]);

    assert!(compiler.build_from_path(root.join("missing.vel")).is_none());
    assert_eq!(codes(compiler.diagnostics()), vec!["E123"]);
}

#[test]
fn std_widgets_follow_the_style() {
    let source = "import { Button } from \"std-widgets.vel\";\n\
                  export component App {\n    ok := Button { text: \"Go\"; }\n    out property <brush> accent: ok.background;\n}\n";
    for (style, accent) in [("fluent", "#0078d4ff"), ("material", "#6750a4ff")] {
        let mut compiler = ComponentCompiler::with_configuration(CompilerConfiguration {
            include_paths: Vec::new(),
            style: style.to_string(),
        });
        let definition = compiler.build_from_source(source, "app.vel").expect("definition");
        assert_eq!(definition.style(), style);
        let accent_value = definition.create().get_property("accent").expect("accent");
        assert_eq!(accent_value.to_string(), accent);
    }
}

#[test]
fn unknown_style_is_an_error() {
    let mut compiler = compiler();
    compiler.set_style("brutalist");
    assert!(compiler.build_from_source("export component A {}", "a.vel").is_none());
    let diagnostics = compiler.diagnostics();
    assert_eq!(codes(diagnostics), vec!["E130"]);
    assert!(!diagnostics[0].hints().is_empty());
}

#[test]
fn unchanged_documents_are_parsed_once() {
    let mut compiler = compiler();
    let source = "export component A { in property <int> n; }";
    compiler.build_from_source(source, "a.vel").expect("first build");
    compiler.build_from_source(source, "a.vel").expect("second build");
    assert_eq!(compiler.cached_documents(), 1);

    compiler.build_from_source("export component B {}", "a.vel").expect("third build");
    assert_eq!(compiler.cached_documents(), 2);
    compiler.clear_cache();
    assert_eq!(compiler.cached_documents(), 0);
}

#[test]
fn units_are_normalized_at_compile_time() {
    let definition = compile(
        "export component Units {\n\
         out property <length> a: 3pt;\n\
         out property <duration> b: 1.5s;\n\
         out property <angle> c: 0.25turn;\n\
         out property <percent> d: 40%;\n}\n",
    );
    let instance = definition.create();
    assert_eq!(instance.get_property("a"), Some(Value::from(4)));
    assert_eq!(instance.get_property("b"), Some(Value::from(1500)));
    assert_eq!(instance.get_property("c"), Some(Value::from(90)));
    assert_eq!(instance.get_property("d"), Some(Value::from(40)));
}
