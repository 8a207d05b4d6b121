//! Conversion between [`Value`] and JSON, for the command line and for hosts
//! that exchange data with other processes.

use serde_json::{Map, Number, Value as Json, json};

use crate::compiler::langtype::Type;
use crate::runtime::{
    brush::{Brush, Color},
    image::Image,
    scene::SceneNode,
    structs::Struct,
    value::{Value, ValueType},
};

#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
    #[error("invalid color `{0}`")]
    InvalidColor(String),
    #[error("struct has no field `{0}`")]
    UnknownField(String),
    #[error(transparent)]
    Image(#[from] crate::runtime::image::LoadImageError),
    #[error(transparent)]
    Syntax(#[from] serde_json::Error),
}

/// Models become arrays, solid brushes `#rrggbbaa` strings, images their
/// path. Integral numbers are written without a fraction.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Void => Json::Null,
        Value::Number(n) => number_to_json(*n),
        Value::String(s) => Json::String(s.to_string()),
        Value::Bool(b) => Json::Bool(*b),
        Value::Struct(s) => Json::Object(
            s.iter()
                .map(|(name, value)| (name.to_string(), value_to_json(value)))
                .collect(),
        ),
        Value::Model(model) => Json::Array(model.iter().map(|row| value_to_json(&row)).collect()),
        Value::Brush(Brush::SolidColor(color)) => Json::String(color.to_string()),
        Value::Brush(Brush::LinearGradient { angle, stops }) => json!({
            "angle": angle,
            "stops": stops
                .iter()
                .map(|stop| json!({ "color": stop.color.to_string(), "position": stop.position }))
                .collect::<Vec<_>>(),
        }),
        Value::Image(image) => image
            .path()
            .map_or(Json::Null, |path| Json::String(path.display().to_string())),
    }
}

fn number_to_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Json::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Json::Null, Json::Number)
}

/// Untyped conversion: arrays become models, objects structs, `null` void.
pub fn value_from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Void,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => Value::from(items.iter().map(value_from_json).collect::<Vec<_>>()),
        Json::Object(fields) => Value::Struct(
            fields
                .iter()
                .map(|(name, value)| (name.as_str(), value_from_json(value)))
                .collect::<Struct>(),
        ),
    }
}

/// Conversion guided by a declared type: strings become colors or images
/// where the type asks for one, struct fields are checked by name.
pub fn json_to_value(json: &Json, ty: &Type) -> Result<Value, JsonError> {
    let mismatch = || JsonError::Mismatch {
        expected: ty.to_string(),
        found: json_kind(json).to_string(),
    };
    let value = match (ty, json) {
        (Type::Void, _) => Value::Void,
        (ty, Json::Number(n)) if ty.value_type() == ValueType::Number => {
            let value = Value::Number(n.as_f64().unwrap_or_default());
            ty.convert(value).ok_or_else(mismatch)?
        }
        (Type::String, Json::String(s)) => Value::from(s.as_str()),
        (Type::Bool, Json::Bool(b)) => Value::Bool(*b),
        (Type::Color | Type::Brush, Json::String(s)) => {
            let color = Color::from_hex(s).ok_or_else(|| JsonError::InvalidColor(s.clone()))?;
            Value::from(color)
        }
        (Type::Image, Json::Null) => Value::Image(Image::default()),
        (Type::Image, Json::String(path)) => Value::Image(Image::load_from_path(path)?),
        (Type::Array(element), Json::Array(items)) => {
            let rows = items
                .iter()
                .map(|item| json_to_value(item, element))
                .collect::<Result<Vec<_>, _>>()?;
            Value::from(rows)
        }
        (Type::Struct(st), Json::Object(fields)) => {
            let mut s = Struct::new();
            for (name, value) in fields {
                let field_ty = st
                    .fields
                    .get(&crate::syntax::normalize_name(name))
                    .ok_or_else(|| JsonError::UnknownField(name.clone()))?;
                s.set_field(name, json_to_value(value, field_ty)?);
            }
            ty.convert(Value::Struct(s)).ok_or_else(mismatch)?
        }
        _ => return Err(mismatch()),
    };
    Ok(value)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

pub fn scene_to_json(node: &SceneNode) -> Json {
    let mut object = Map::new();
    object.insert("type".into(), Json::String(node.type_name.clone()));
    object.insert("element".into(), Json::String(node.element_type.clone()));
    if let Some(id) = &node.id {
        object.insert("id".into(), Json::String(id.clone()));
    }
    let properties: Map<String, Json> = node
        .properties
        .iter()
        .map(|(name, value)| (name.clone(), value_to_json(value)))
        .collect();
    object.insert("properties".into(), Json::Object(properties));
    if !node.children.is_empty() {
        object.insert(
            "children".into(),
            Json::Array(node.children.iter().map(scene_to_json).collect()),
        );
    }
    Json::Object(object)
}
