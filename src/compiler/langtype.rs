use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use crate::runtime::{
    brush::Brush,
    image::Image,
    structs::Struct,
    value::{Value, ValueType},
};

/// Declared type of a property, callback parameter or struct field.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    Int,
    Float,
    String,
    Bool,
    Color,
    Brush,
    Image,
    /// Logical pixels.
    Length,
    /// Milliseconds.
    Duration,
    /// Degrees.
    Angle,
    Percent,
    Array(Box<Type>),
    Struct(Rc<StructType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    /// `None` for anonymous `{ x: float }` types and struct literals.
    pub name: Option<String>,
    pub fields: IndexMap<String, Type>,
}

impl Type {
    pub fn from_builtin_name(name: &str) -> Option<Type> {
        let ty = match name {
            "void" => Type::Void,
            "int" => Type::Int,
            "float" => Type::Float,
            "string" => Type::String,
            "bool" => Type::Bool,
            "color" => Type::Color,
            "brush" => Type::Brush,
            "image" => Type::Image,
            "length" => Type::Length,
            "duration" => Type::Duration,
            "angle" => Type::Angle,
            "percent" => Type::Percent,
            _ => return None,
        };
        Some(ty)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Type::Void => ValueType::Void,
            Type::Int
            | Type::Float
            | Type::Length
            | Type::Duration
            | Type::Angle
            | Type::Percent => ValueType::Number,
            Type::String => ValueType::String,
            Type::Bool => ValueType::Bool,
            Type::Color | Type::Brush => ValueType::Brush,
            Type::Image => ValueType::Image,
            Type::Array(_) => ValueType::Model,
            Type::Struct(_) => ValueType::Struct,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.value_type() == ValueType::Number
    }

    /// Numeric types carrying a unit.
    pub fn is_unit(&self) -> bool {
        matches!(
            self,
            Type::Length | Type::Duration | Type::Angle | Type::Percent
        )
    }

    pub fn default_value(&self) -> Value {
        match self {
            Type::Void => Value::Void,
            Type::Int
            | Type::Float
            | Type::Length
            | Type::Duration
            | Type::Angle
            | Type::Percent => Value::Number(0.0),
            Type::String => Value::from(""),
            Type::Bool => Value::Bool(false),
            Type::Color | Type::Brush => Value::Brush(Brush::default()),
            Type::Image => Value::Image(Image::default()),
            Type::Array(_) => Value::from(Vec::new()),
            Type::Struct(st) => Value::Struct(
                st.fields
                    .iter()
                    .map(|(name, ty)| (name.as_str(), ty.default_value()))
                    .collect(),
            ),
        }
    }

    /// Whether an expression of type `from` may be stored in a slot of this
    /// type. Checked at compile time; [`Type::convert`] is the run-time side.
    pub fn accepts(&self, from: &Type) -> bool {
        if self == from {
            return true;
        }
        match (self, from) {
            (Type::Void, _) => true,
            (to, Type::Int | Type::Float) if to.is_numeric() => true,
            (Type::Color, Type::Brush) | (Type::Brush, Type::Color) => true,
            (Type::Array(to), Type::Array(from)) => **from == Type::Void || to.accepts(from),
            (Type::Struct(to), Type::Struct(from)) => from.fields.iter().all(|(name, ty)| {
                to.fields.get(name).is_some_and(|field| field.accepts(ty))
            }),
            _ => false,
        }
    }

    /// Convert a host or computed value for storage in a slot of this type.
    ///
    /// `int` truncates toward zero. Struct values must not carry unknown
    /// fields; missing ones take their default. Returns `None` when the value
    /// cannot be stored.
    pub fn convert(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (Type::Void, _) => Some(Value::Void),
            (Type::Int, Value::Number(n)) => Some(Value::Number(n.trunc())),
            (ty, Value::Number(n)) if ty.is_numeric() => Some(Value::Number(n)),
            (Type::String, value @ Value::String(_)) => Some(value),
            (Type::Bool, value @ Value::Bool(_)) => Some(value),
            (Type::Image, value @ Value::Image(_)) => Some(value),
            (Type::Brush, value @ Value::Brush(_)) => Some(value),
            (Type::Color, Value::Brush(brush)) => brush.as_solid_color().map(Value::from),
            (Type::Array(_), value @ Value::Model(_)) => Some(value),
            (Type::Struct(st), Value::Struct(s)) => st.convert_struct(s).map(Value::Struct),
            _ => None,
        }
    }
}

impl StructType {
    fn convert_struct(&self, mut s: Struct) -> Option<Struct> {
        if s.iter().any(|(name, _)| !self.fields.contains_key(name)) {
            return None;
        }
        let mut out = Struct::new();
        for (name, ty) in &self.fields {
            let value = match s.remove_field(name) {
                Some(value) => ty.convert(value)?,
                None => ty.default_value(),
            };
            out.set_field(name, value);
        }
        Some(out)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Bool => write!(f, "bool"),
            Type::Color => write!(f, "color"),
            Type::Brush => write!(f, "brush"),
            Type::Image => write!(f, "image"),
            Type::Length => write!(f, "length"),
            Type::Duration => write!(f, "duration"),
            Type::Angle => write!(f, "angle"),
            Type::Percent => write!(f, "percent"),
            Type::Array(element) => write!(f, "[{}]", element),
            Type::Struct(st) => match &st.name {
                Some(name) => write!(f, "{}", name),
                None => {
                    let fields: Vec<String> = st
                        .fields
                        .iter()
                        .map(|(name, ty)| format!("{}: {}", name, ty))
                        .collect();
                    write!(f, "{{ {} }}", fields.join(", "))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::brush::{Color, GradientStop};

    fn point() -> Type {
        Type::Struct(Rc::new(StructType {
            name: Some("Point".into()),
            fields: IndexMap::from([("x".to_string(), Type::Float), ("y".to_string(), Type::Float)]),
        }))
    }

    #[test]
    fn int_truncates_toward_zero() {
        assert_eq!(Type::Int.convert(Value::from(2.9)), Some(Value::from(2)));
        assert_eq!(Type::Int.convert(Value::from(-2.9)), Some(Value::from(-2)));
        assert_eq!(Type::Int.convert(Value::from("2")), None);
    }

    #[test]
    fn color_accepts_only_solid_brushes() {
        let red = Value::from(Color::from_rgb_u8(255, 0, 0));
        assert_eq!(Type::Color.convert(red.clone()), Some(red));
        let gradient = Value::Brush(Brush::LinearGradient {
            angle: 0.0,
            stops: vec![GradientStop {
                color: Color::BLACK,
                position: 0.0,
            }],
        });
        assert_eq!(Type::Color.convert(gradient.clone()), None);
        assert_eq!(Type::Brush.convert(gradient.clone()), Some(gradient));
    }

    #[test]
    fn struct_conversion_fills_defaults_and_rejects_unknown_fields() {
        let partial = Value::from(Struct::from_iter([("x", Value::from(1))]));
        let converted = point().convert(partial).unwrap();
        assert_eq!(
            converted.as_struct().and_then(|s| s.get_field("y")),
            Some(&Value::from(0))
        );

        let extra = Value::from(Struct::from_iter([("z", Value::from(1))]));
        assert_eq!(point().convert(extra), None);

        let wrong = Value::from(Struct::from_iter([("x", Value::from("one"))]));
        assert_eq!(point().convert(wrong), None);
    }

    #[test]
    fn plain_numbers_are_accepted_by_unit_types() {
        assert!(Type::Length.accepts(&Type::Float));
        assert!(Type::Int.accepts(&Type::Float));
        assert!(!Type::Length.accepts(&Type::Duration));
        assert!(!Type::String.accepts(&Type::Int));
        assert!(Type::Array(Box::new(Type::Int)).accepts(&Type::Array(Box::new(Type::Void))));
    }

    #[test]
    fn defaults_match_value_types() {
        for ty in [Type::Int, Type::String, Type::Bool, Type::Brush, Type::Image, point()] {
            assert_eq!(ty.default_value().value_type(), ty.value_type(), "{}", ty);
        }
        assert_eq!(Type::Array(Box::new(Type::Int)).default_value().to_array(), Some(vec![]));
    }

    #[test]
    fn display_renders_nested_types() {
        assert_eq!(Type::Array(Box::new(point())).to_string(), "[Point]");
        let anonymous = Type::Struct(Rc::new(StructType {
            name: None,
            fields: IndexMap::from([("a".to_string(), Type::Int)]),
        }));
        assert_eq!(anonymous.to_string(), "{ a: int }");
    }
}
