use std::{fmt, rc::Rc};

use serde::Serialize;

use crate::runtime::{
    brush::{Brush, Color},
    image::Image,
    model::{ModelRc, VecModel},
    structs::Struct,
};

/// Immutable, reference-counted string payload.
pub type SharedString = Rc<str>;

/// Tag of a [`Value`], used for property descriptors and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Void,
    Number,
    String,
    Bool,
    Struct,
    Model,
    Brush,
    Image,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::Struct => "struct",
            ValueType::Model => "model",
            ValueType::Brush => "brush",
            ValueType::Image => "image",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dynamically typed value exchanged between host code and a running component.
///
/// ## Ownership
///
/// A `Value` is exclusively owned by its holder: a struct field, a property
/// slot, an argument list or a host variable. Cloning is a logical copy:
///
/// - strings and models are reference-counted and shared, which is
///   unobservable for strings since they are immutable;
/// - struct payloads are deep-copied, so mutating a clone never affects the
///   original.
///
/// [`Value::take`] moves a value out of its slot and leaves `Void` behind.
///
/// ## Equality
///
/// Equality is structural. Values with different tags are never equal, even
/// when a conversion between them exists. Two models are equal when they are
/// the same adapter, or when they expose the same number of pairwise-equal
/// rows.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value; also the result of callbacks without a return type.
    #[default]
    Void,
    /// Every numeric type (int, float, length, duration, angle, percent).
    Number(f64),
    String(SharedString),
    Bool(bool),
    Struct(Struct),
    /// Shared handle to an indexed collection of rows.
    Model(ModelRc),
    Brush(Brush),
    Image(Image),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Void => ValueType::Void,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Struct(_) => ValueType::Struct,
            Value::Model(_) => ValueType::Model,
            Value::Brush(_) => ValueType::Brush,
            Value::Image(_) => ValueType::Image,
        }
    }

    /// Label used in logs and error messages.
    pub fn type_name(&self) -> &'static str {
        self.value_type().as_str()
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Move the value out, leaving `Void`.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelRc> {
        match self {
            Value::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_brush(&self) -> Option<&Brush> {
        match self {
            Value::Brush(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Value::Image(i) => Some(i),
            _ => None,
        }
    }

    /// Snapshot of the rows of a model value.
    pub fn to_array(&self) -> Option<Vec<Value>> {
        self.as_model().map(|model| model.iter().collect())
    }

    /// Text used when a value is concatenated into a string: no quotes.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Model(a), Value::Model(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let count = a.row_count();
                count == b.row_count() && (0..count).all(|row| a.row_data(row) == b.row_data(row))
            }
            (Value::Brush(a), Value::Brush(b)) => a == b,
            (Value::Image(a), Value::Image(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Struct(s) => write!(f, "{}", s),
            Value::Model(model) => {
                let items: Vec<String> = model.iter().map(|row| row.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Brush(brush) => write!(f, "{}", brush),
            Value::Image(image) => write!(f, "{}", image),
        }
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(f64, f32, i32, i64, u32, usize);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<SharedString> for Value {
    fn from(s: SharedString) -> Self {
        Value::String(s)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Value::Struct(s)
    }
}

impl From<Brush> for Value {
    fn from(b: Brush) -> Self {
        Value::Brush(b)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Brush(Brush::SolidColor(c))
    }
}

impl From<Image> for Value {
    fn from(i: Image) -> Self {
        Value::Image(i)
    }
}

impl From<ModelRc> for Value {
    fn from(m: ModelRc) -> Self {
        Value::Model(m)
    }
}

/// Wraps the rows in a fresh [`VecModel`].
impl From<Vec<Value>> for Value {
    fn from(rows: Vec<Value>) -> Self {
        Value::Model(ModelRc::new(VecModel::from(rows)))
    }
}

/// Returned by the `TryFrom<Value>` conversions when the tag does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected a {expected} value, found {found}")]
pub struct ValueTypeError {
    pub expected: ValueType,
    pub found: ValueType,
}

macro_rules! try_from_value {
    ($ty:ty, $expected:ident, |$v:ident| $convert:expr) => {
        impl TryFrom<Value> for $ty {
            type Error = ValueTypeError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$expected($v) => Ok($convert),
                    other => Err(ValueTypeError {
                        expected: ValueType::$expected,
                        found: other.value_type(),
                    }),
                }
            }
        }
    };
}

try_from_value!(f64, Number, |n| n);
try_from_value!(i32, Number, |n| n as i32);
try_from_value!(bool, Bool, |b| b);
try_from_value!(String, String, |s| s.to_string());
try_from_value!(SharedString, String, |s| s);
try_from_value!(Struct, Struct, |s| s);
try_from_value!(Brush, Brush, |b| b);
try_from_value!(Image, Image, |i| i);
try_from_value!(ModelRc, Model, |m| m);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_void_and_take_leaves_void() {
        let mut value = Value::from("hello");
        let taken = value.take();
        assert_eq!(taken, Value::from("hello"));
        assert!(value.is_void());
        assert_eq!(Value::default().value_type(), ValueType::Void);
    }

    #[test]
    fn accessors_are_queries() {
        let value = Value::from(3);
        assert_eq!(value.as_number(), Some(3.0));
        assert_eq!(value.as_str(), None);
        assert_eq!(value.as_bool(), None);
        assert!(value.as_model().is_none());
    }

    #[test]
    fn different_tags_are_never_equal() {
        assert_ne!(Value::from(1), Value::from(true));
        assert_ne!(Value::from("1"), Value::from(1));
        assert_ne!(Value::Void, Value::from(0));
    }

    #[test]
    fn struct_clone_does_not_alias() {
        let original = Value::from(Struct::from_iter([("a", Value::from(1))]));
        let mut copy = original.clone();
        assert_eq!(copy, original);
        if let Value::Struct(s) = &mut copy {
            s.set_field("a", Value::from(2));
        }
        assert_ne!(copy, original);
        assert_eq!(
            original.as_struct().and_then(|s| s.get_field("a")),
            Some(&Value::from(1))
        );
    }

    #[test]
    fn models_compare_by_rows() {
        let a = Value::from(vec![Value::from(1), Value::from(2)]);
        let b = Value::from(vec![Value::from(1), Value::from(2)]);
        let c = Value::from(vec![Value::from(1)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_array(), Some(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn try_from_reports_both_tags() {
        let err = f64::try_from(Value::from("x")).unwrap_err();
        assert_eq!(err.expected, ValueType::Number);
        assert_eq!(err.found, ValueType::String);
        assert_eq!(err.to_string(), "expected a number value, found string");
        assert_eq!(i32::try_from(Value::from(7.9)), Ok(7));
    }

    #[test]
    fn display_renders_nested_values() {
        let value = Value::from(vec![Value::from("a"), Value::from(1.5), Value::from(false)]);
        assert_eq!(value.to_string(), "[\"a\", 1.5, false]");
        assert_eq!(Value::from("a").to_plain_string(), "a");
    }
}
