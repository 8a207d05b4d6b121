use std::fmt;

use crate::diagnostics::Span;

use super::Identifier;

/// Unit suffix of a number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Px,
    Pt,
    S,
    Ms,
    Deg,
    Rad,
    Turn,
    Percent,
}

impl Unit {
    pub fn from_suffix(suffix: &str) -> Option<Unit> {
        Some(match suffix {
            "" => Unit::None,
            "px" => Unit::Px,
            "pt" => Unit::Pt,
            "s" => Unit::S,
            "ms" => Unit::Ms,
            "deg" => Unit::Deg,
            "rad" => Unit::Rad,
            "turn" => Unit::Turn,
            "%" => Unit::Percent,
            _ => return None,
        })
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Px => "px",
            Unit::Pt => "pt",
            Unit::S => "s",
            Unit::Ms => "ms",
            Unit::Deg => "deg",
            Unit::Rad => "rad",
            Unit::Turn => "turn",
            Unit::Percent => "%",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Identifier {
        name: Identifier,
        span: Span,
    },
    Number {
        value: f64,
        unit: Unit,
        span: Span,
    },
    String {
        value: String,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    /// `#rrggbbaa` normalized to ARGB.
    Color {
        argb: u32,
        span: Span,
    },
    ImageUrl {
        path: String,
        span: Span,
    },
    Array {
        elements: Vec<Expression>,
        span: Span,
    },
    StructLiteral {
        fields: Vec<(Identifier, Expression)>,
        span: Span,
    },
    Member {
        object: Box<Expression>,
        member: Identifier,
        span: Span,
    },
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
        span: Span,
    },
    Prefix {
        operator: String,
        right: Box<Expression>,
        span: Span,
    },
    Infix {
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
        span: Span,
    },
    Conditional {
        condition: Box<Expression>,
        consequence: Box<Expression>,
        alternative: Box<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier { span, .. }
            | Expression::Number { span, .. }
            | Expression::String { span, .. }
            | Expression::Boolean { span, .. }
            | Expression::Color { span, .. }
            | Expression::ImageUrl { span, .. }
            | Expression::Array { span, .. }
            | Expression::StructLiteral { span, .. }
            | Expression::Member { span, .. }
            | Expression::Index { span, .. }
            | Expression::Call { span, .. }
            | Expression::Prefix { span, .. }
            | Expression::Infix { span, .. }
            | Expression::Conditional { span, .. } => *span,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier { name, .. } => write!(f, "{}", name),
            Expression::Number { value, unit, .. } => write!(f, "{}{}", value, unit.suffix()),
            Expression::String { value, .. } => write!(f, "{:?}", value),
            Expression::Boolean { value, .. } => write!(f, "{}", value),
            Expression::Color { argb, .. } => {
                let [a, r, g, b] = argb.to_be_bytes();
                write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
            }
            Expression::ImageUrl { path, .. } => write!(f, "@image-url({:?})", path),
            Expression::Array { elements, .. } => {
                let items: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Expression::StructLiteral { fields, .. } => {
                let items: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .collect();
                write!(f, "{{ {} }}", items.join(", "))
            }
            Expression::Member { object, member, .. } => write!(f, "{}.{}", object, member),
            Expression::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, args.join(", "))
            }
            Expression::Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Conditional {
                condition,
                consequence,
                alternative,
                ..
            } => write!(f, "({} ? {} : {})", condition, consequence, alternative),
        }
    }
}
