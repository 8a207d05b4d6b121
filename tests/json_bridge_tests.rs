mod common;

use std::fs;

use common::{compile, temp_root};
use serde_json::{Value as Json, json};
use vellum::{
    ComponentDefinition, ComponentInstance, Value,
    runtime::json::{JsonError, json_to_value, scene_to_json, value_from_json, value_to_json},
};

const SETTINGS: &str = r#"
export struct Margins { top: length, bottom: length }

export component Settings {
    in-out property <string> title: "Untitled";
    in-out property <int> volume: 5;
    in-out property <bool> muted;
    in-out property <color> accent: #336699;
    in-out property <Margins> margins;
    in-out property <[int]> presets: [1, 2];
    in-out property <image> icon;
    callback describe(string, int) -> string;
    describe(name, level) => { return name + "@" + level; }
}
"#;

fn properties_json(definition: &ComponentDefinition, instance: &ComponentInstance) -> Json {
    Json::Object(
        definition
            .properties()
            .into_iter()
            .filter_map(|property| {
                let value = instance.get_property(&property.name)?;
                Some((property.name, value_to_json(&value)))
            })
            .collect(),
    )
}

fn assign(definition: &ComponentDefinition, instance: &ComponentInstance, name: &str, json: Json) -> Result<(), JsonError> {
    let ty = definition.property_type(name).expect("known property");
    let value = json_to_value(&json, &ty)?;
    assert!(instance.set_property(name, value), "{} rejected a converted value", name);
    Ok(())
}

#[test]
fn properties_export_as_json() {
    let definition = compile(SETTINGS);
    let instance = definition.create();
    assert_eq!(
        properties_json(&definition, &instance),
        json!({
            "title": "Untitled",
            "volume": 5,
            "muted": false,
            "accent": "#336699ff",
            "margins": { "top": 0, "bottom": 0 },
            "presets": [1, 2],
            "icon": null,
        })
    );
}

#[test]
fn typed_assignment_converts_json() {
    let definition = compile(SETTINGS);
    let instance = definition.create();

    assign(&definition, &instance, "volume", json!(7.9)).unwrap();
    assign(&definition, &instance, "accent", json!("#fff")).unwrap();
    assign(&definition, &instance, "margins", json!({ "top": 4 })).unwrap();
    assign(&definition, &instance, "presets", json!([3])).unwrap();
    assign(&definition, &instance, "muted", json!(true)).unwrap();

    let exported = properties_json(&definition, &instance);
    assert_eq!(exported["volume"], json!(7));
    assert_eq!(exported["accent"], json!("#ffffffff"));
    assert_eq!(exported["margins"], json!({ "top": 4, "bottom": 0 }));
    assert_eq!(exported["presets"], json!([3]));
    assert_eq!(exported["muted"], json!(true));
}

#[test]
fn typed_assignment_rejects_mismatches() {
    let definition = compile(SETTINGS);
    let instance = definition.create();

    let err = assign(&definition, &instance, "volume", json!("loud")).unwrap_err();
    assert_eq!(err.to_string(), "expected int, found a string");

    let err = assign(&definition, &instance, "accent", json!("blue")).unwrap_err();
    assert!(matches!(err, JsonError::InvalidColor(text) if text == "blue"));

    let err = assign(&definition, &instance, "margins", json!({ "left": 1 })).unwrap_err();
    assert!(matches!(err, JsonError::UnknownField(name) if name == "left"));

    let err = assign(&definition, &instance, "presets", json!(["x"])).unwrap_err();
    assert!(matches!(err, JsonError::Mismatch { .. }));

    let err = assign(&definition, &instance, "icon", json!("/definitely/not/here.png")).unwrap_err();
    assert!(matches!(err, JsonError::Image(_)));

    assert_eq!(instance.get_property("volume"), Some(Value::from(5)));
}

#[test]
fn image_paths_load_and_export() {
    let root = temp_root("json_image");
    let path = root.join("dot.gif");
    fs::write(&path, b"GIF89a\x02\x00\x03\x00\x00\x00\x00").unwrap();

    let definition = compile(SETTINGS);
    let instance = definition.create();
    let text = path.display().to_string();
    assign(&definition, &instance, "icon", json!(text)).unwrap();

    let icon = instance.get_property("icon").unwrap();
    assert_eq!(icon.as_image().map(|image| image.size()), Some((2, 3)));
    assert_eq!(value_to_json(&icon), json!(text));

    assign(&definition, &instance, "icon", Json::Null).unwrap();
    assert_eq!(value_to_json(&instance.get_property("icon").unwrap()), Json::Null);
}

#[test]
fn untyped_arguments_drive_callbacks() {
    let instance = compile(SETTINGS).create();
    let args: Vec<Value> = match json!(["vol", 3]) {
        Json::Array(items) => items.iter().map(value_from_json).collect(),
        _ => unreachable!(),
    };
    let result = instance.invoke_callback("describe", &args).unwrap();
    assert_eq!(value_to_json(&result), json!("vol@3"));
}

#[test]
fn scenes_export_as_nested_objects() {
    let instance = compile(
        "export component Card inherits Rectangle {\n\
         in property <string> heading: \"Hello\";\n\
         background: #ff0000;\n\
         label := Text { text: heading; }\n}\n",
    )
    .create();

    assert_eq!(
        scene_to_json(&instance.render_scene()),
        json!({
            "type": "Card",
            "element": "Rectangle",
            "properties": { "heading": "Hello", "background": "#ff0000ff" },
            "children": [
                { "type": "Text", "element": "Text", "id": "label", "properties": { "text": "Hello" } },
            ],
        })
    );
}
