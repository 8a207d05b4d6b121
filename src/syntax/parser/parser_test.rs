use crate::syntax::document::{Document, Item, Member, TypeExpr, Visibility};
use crate::syntax::expression::{Expression, Unit};
use crate::syntax::statement::Statement;
use crate::syntax::{lexer::Lexer, parser::Parser};

fn parse_ok(input: &str) -> Document {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer);
    let document = parser.parse_document();
    assert!(
        parser.errors.is_empty(),
        "parser errors: {:?}",
        parser.errors
    );
    document
}

fn parse_errors(input: &str) -> Vec<String> {
    let mut parser = Parser::new(Lexer::new(input));
    let _ = parser.parse_document();
    parser
        .errors
        .iter()
        .map(|d| format!("{} {}", d.code().unwrap_or(""), d.text()))
        .collect()
}

fn only_component_members(document: &Document) -> &[Member] {
    match &document.items[..] {
        [Item::Component(component)] => &component.members,
        other => panic!("expected a single component, got {:?}", other),
    }
}

fn binding_expression(input: &str) -> String {
    let source = format!("component C {{ x: {}; }}", input);
    let document = parse_ok(&source);
    match &only_component_members(&document)[0] {
        Member::Binding(binding) => binding.expression.to_string(),
        other => panic!("expected binding, got {:?}", other),
    }
}

#[test]
fn parses_exported_empty_component() {
    let document = parse_ok("export component Foo {}");
    match &document.items[..] {
        [Item::Component(component)] => {
            assert!(component.exported);
            assert_eq!(component.name.as_str(), "Foo");
            assert!(component.members.is_empty());
        }
        other => panic!("unexpected items {:?}", other),
    }
}

#[test]
fn parses_property_declarations_with_qualifiers() {
    let document = parse_ok(
        "component C {
            in property <int> a;
            out property <string> b: \"x\";
            in-out property <[int]> c;
            private property <{ x: float, y: float }> d;
            property <bool> e;
        }",
    );
    let visibilities: Vec<Visibility> = only_component_members(&document)
        .iter()
        .map(|m| match m {
            Member::Property(p) => p.visibility,
            other => panic!("expected property, got {:?}", other),
        })
        .collect();
    assert_eq!(
        visibilities,
        vec![
            Visibility::In,
            Visibility::Out,
            Visibility::InOut,
            Visibility::Private,
            Visibility::InOut
        ]
    );

    match &only_component_members(&document)[2] {
        Member::Property(p) => assert!(matches!(p.ty, TypeExpr::Array { .. })),
        _ => unreachable!(),
    }
}

#[test]
fn underscores_in_names_are_normalized() {
    let document = parse_ok("component C { property <int> foo_bar; }");
    match &only_component_members(&document)[0] {
        Member::Property(p) => assert_eq!(p.name.as_str(), "foo-bar"),
        _ => unreachable!(),
    }
}

#[test]
fn parses_callbacks_with_named_and_unnamed_parameters() {
    let document = parse_ok(
        "component C {
            callback clicked;
            callback add(int, amount: int) -> int;
        }",
    );
    let members = only_component_members(&document);
    match (&members[0], &members[1]) {
        (Member::Callback(a), Member::Callback(b)) => {
            assert!(a.parameters.is_empty());
            assert!(a.return_type.is_none());
            assert_eq!(b.parameters.len(), 2);
            assert_eq!(b.return_type.as_ref().map(|t| t.to_string()), Some("int".into()));
        }
        other => panic!("unexpected members {:?}", other),
    }
}

#[test]
fn parses_handlers_elements_and_repeaters() {
    let document = parse_ok(
        "component C {
            callback add(int, int) -> int;
            add(a, b) => { return a + b; }
            title := Text { text: \"hi\"; }
            Rectangle { }
            for item[i] in [1, 2] : Text { text: item; }
        }",
    );
    let members = only_component_members(&document);
    match &members[1] {
        Member::Handler(h) => {
            assert_eq!(h.parameters.len(), 2);
            assert!(matches!(h.body.statements[0], Statement::Return { .. }));
        }
        other => panic!("expected handler, got {:?}", other),
    }
    match &members[2] {
        Member::Element(e) => {
            assert_eq!(e.id.as_ref().map(|i| i.as_str()), Some("title"));
            assert_eq!(e.type_name.as_str(), "Text");
        }
        other => panic!("expected element, got {:?}", other),
    }
    assert!(matches!(&members[3], Member::Element(e) if e.id.is_none()));
    match &members[4] {
        Member::Repeater(r) => {
            assert_eq!(r.item.as_str(), "item");
            assert_eq!(r.index.as_ref().map(|i| i.as_str()), Some("i"));
            assert_eq!(r.element.type_name.as_str(), "Text");
        }
        other => panic!("expected repeater, got {:?}", other),
    }
}

#[test]
fn parses_imports_structs_and_globals() {
    let document = parse_ok(
        "import { Button, LineEdit as Edit } from \"std-widgets.vel\";
         export struct Point { x: float, y: float, }
         export global Settings { in-out property <int> volume: 3; }
         export { Point as P };",
    );
    assert_eq!(document.items.len(), 4);
    match &document.items[0] {
        Item::Import(import) => {
            assert_eq!(import.path, "std-widgets.vel");
            assert_eq!(import.names[1].visible_name().as_str(), "Edit");
        }
        other => panic!("expected import, got {:?}", other),
    }
    assert!(matches!(&document.items[1], Item::Struct(s) if s.fields.len() == 2));
    assert!(matches!(&document.items[2], Item::Global(g) if g.exported));
    assert!(matches!(&document.items[3], Item::Export(e) if e.names.len() == 1));
}

#[test]
fn operator_precedence() {
    assert_eq!(binding_expression("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(binding_expression("-a + b"), "((-a) + b)");
    assert_eq!(binding_expression("a || b && c"), "(a || (b && c))");
    assert_eq!(binding_expression("a < b == c"), "((a < b) == c)");
    assert_eq!(binding_expression("a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
    assert_eq!(binding_expression("self.items[0].name"), "(self.items[0]).name");
    assert_eq!(binding_expression("max(1, 2 + 3)"), "max(1, (2 + 3))");
}

#[test]
fn parses_literals_with_units_and_colors() {
    let document = parse_ok("component C { a: 10px; b: 50%; c: #ff0000; d: @image-url(\"a.png\"); }");
    let members = only_component_members(&document);
    match &members[0] {
        Member::Binding(b) => {
            assert!(matches!(b.expression, Expression::Number { value, unit: Unit::Px, .. } if value == 10.0))
        }
        _ => unreachable!(),
    }
    match &members[1] {
        Member::Binding(b) => {
            assert!(matches!(b.expression, Expression::Number { unit: Unit::Percent, .. }))
        }
        _ => unreachable!(),
    }
    match &members[2] {
        Member::Binding(b) => {
            assert!(matches!(b.expression, Expression::Color { argb: 0xffff0000, .. }))
        }
        _ => unreachable!(),
    }
    match &members[3] {
        Member::Binding(b) => {
            assert!(matches!(&b.expression, Expression::ImageUrl { path, .. } if path == "a.png"))
        }
        _ => unreachable!(),
    }
}

#[test]
fn parses_statements() {
    let document = parse_ok(
        "component C {
            callback go;
            go => {
                counter += 1;
                if counter > 3 { counter = 0; } else if counter == 2 { debug(\"two\"); } else { }
                return
            }
        }",
    );
    match &only_component_members(&document)[1] {
        Member::Handler(h) => {
            let rendered: Vec<String> = h.body.statements.iter().map(|s| s.to_string()).collect();
            assert_eq!(rendered[0], "counter += 1;");
            assert!(rendered[1].starts_with("if (counter > 3) { counter = 0; } else { if (counter == 2)"));
            assert_eq!(rendered[2], "return;");
        }
        other => panic!("expected handler, got {:?}", other),
    }
}

#[test]
fn two_way_bindings_are_rejected() {
    let errors = parse_errors("component C { property <int> a <=> b; }");
    assert_eq!(errors, vec!["E008 Two-way binding `<=>` is not supported."]);
}

#[test]
fn recovers_after_a_broken_member() {
    let errors = parse_errors(
        "component C {
            property <int> a: ;
            property <int> b: 1;
            callback;
        }
        component D {}",
    );
    assert_eq!(
        errors,
        vec![
            "E007 Expected an expression, found `;`.",
            "E001 Expected a name, found `;`.",
        ]
    );
}

#[test]
fn reports_invalid_literals() {
    let errors = parse_errors("component C { a: 10furlongs; b: #12; c: \"open\n; }");
    assert_eq!(errors[0], "E004 Invalid number literal `10furlongs`.");
    assert_eq!(errors[1], "E005 Invalid color literal `#12`.");
    assert!(errors.iter().any(|e| e.starts_with("E002")));
}

#[test]
fn missing_closing_brace_is_reported() {
    let errors = parse_errors("component C { property <int> a;");
    assert_eq!(errors, vec!["E001 Expected `}`, found `end of file`."]);
}

#[test]
fn stray_top_level_token_is_reported() {
    let errors = parse_errors("property <int> x; export component C {}");
    assert_eq!(
        errors[0],
        "E001 Expected `import`, `export`, `component`, `struct` or `global`, found `property`."
    );
}

#[test]
fn string_literals_keep_value_and_span() {
    let document = parse_ok("component C { x: \"hello\"; }");
    match &only_component_members(&document)[0] {
        Member::Binding(binding) => match &binding.expression {
            Expression::String { value, span } => {
                assert_eq!(value, "hello");
                assert_eq!(span.start.line, 1);
                assert!(span.end.column > span.start.column);
            }
            other => panic!("expected string literal, got {:?}", other),
        },
        other => panic!("expected binding, got {:?}", other),
    }
}
