mod common;

use common::{compile, compiler};
use vellum::{ValueType, compiler::langtype::Type, runtime::definition::PropertyDescriptor};

const PROFILE: &str = r#"
export struct Address { street: string, number: int }

export global Session {
    in-out property <string> user: "guest";
    private property <int> token;
    callback logout();
}

export component Profile inherits Rectangle {
    in property <string> name;
    out property <int> name-length: 4;
    in-out property <Address> address;
    in-out property <[string]> tags;
    private property <bool> dirty;
    callback save(string, int) -> bool;
    callback cancel;
    width: 100px;
}
"#;

fn descriptor(name: &str, value_type: ValueType) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.to_string(),
        value_type,
    }
}

#[test]
fn public_properties_in_declaration_order() {
    let definition = compile(PROFILE);
    assert_eq!(
        definition.properties(),
        vec![
            descriptor("name", ValueType::String),
            descriptor("name-length", ValueType::Number),
            descriptor("address", ValueType::Struct),
            descriptor("tags", ValueType::Model),
        ]
    );
}

#[test]
fn callbacks_exclude_builtin_ones() {
    let definition = compile(PROFILE);
    assert_eq!(definition.callbacks(), vec!["save", "cancel"]);
}

#[test]
fn globals_are_listed_by_exported_name() {
    let definition = compile(PROFILE);
    assert_eq!(definition.globals(), vec!["Session"]);
    assert_eq!(
        definition.global_properties("Session"),
        Some(vec![descriptor("user", ValueType::String)])
    );
    assert_eq!(definition.global_callbacks("Session"), Some(vec!["logout".to_string()]));
    assert_eq!(definition.global_properties("Nope"), None);
    assert_eq!(definition.global_callbacks("Nope"), None);
}

#[test]
fn empty_global_is_present_but_has_no_members() {
    let definition = compile("export global Empty {}\nexport component Host {}\n");
    assert_eq!(definition.globals(), vec!["Empty"]);
    assert_eq!(definition.global_properties("Empty"), Some(vec![]));
    assert_eq!(definition.global_callbacks("Empty"), Some(vec![]));
    assert_eq!(definition.global_properties("Missing"), None);
    assert_eq!(definition.global_callbacks("Missing"), None);
}

#[test]
fn property_types_accept_either_spelling() {
    let definition = compile(PROFILE);
    assert_eq!(definition.property_type("name_length"), Some(Type::Int));
    assert_eq!(definition.property_type("name-length"), Some(Type::Int));
    assert_eq!(
        definition.property_type("tags"),
        Some(Type::Array(Box::new(Type::String)))
    );
    assert_eq!(definition.property_type("dirty"), None);
    assert_eq!(definition.property_type("width"), None);
    assert_eq!(
        definition.global_property_type("Session", "user"),
        Some(Type::String)
    );
}

#[test]
fn empty_component_has_empty_surface() {
    let definition = compile("export component Blank {}");
    assert!(definition.properties().is_empty());
    assert!(definition.callbacks().is_empty());
    assert!(definition.globals().is_empty());
}

#[test]
fn each_create_yields_an_independent_instance() {
    let definition = compile("export component C { in-out property <int> n; }");
    let a = definition.create();
    let b = definition.create();
    assert!(a.set_property("n", vellum::Value::from(1)));
    assert_eq!(b.get_property("n"), Some(vellum::Value::from(0)));
    assert!(!a.ptr_eq(&b));
    assert!(a.definition().ptr_eq(&definition));
}

#[test]
fn summary_serializes_the_public_surface() {
    let mut compiler = compiler();
    let definition = compiler
        .build_from_source(
            "export global Prefs { in property <bool> dark; }\n\
             export component Counter {\n\
                 in-out property <int> count: 3;\n\
                 out property <string> label: \"n=\" + count;\n\
                 callback add(int) -> int;\n\
             }\n",
            "",
        )
        .expect("definition");

    let json = serde_json::to_string_pretty(&definition.summary()).unwrap();
    insta::assert_snapshot!(json, @r#"
    {
      "name": "Counter",
      "style": "fluent",
      "properties": [
        {
          "name": "count",
          "type": "int",
          "value_type": "number",
          "access": "in-out"
        },
        {
          "name": "label",
          "type": "string",
          "value_type": "string",
          "access": "out"
        }
      ],
      "callbacks": [
        {
          "name": "add",
          "parameters": [
            "int"
          ],
          "return_type": "int"
        }
      ],
      "globals": [
        {
          "name": "Prefs",
          "properties": [
            {
              "name": "dark",
              "type": "bool",
              "value_type": "bool",
              "access": "in"
            }
          ],
          "callbacks": []
        }
      ]
    }
    "#);
}
