//! Resolved expressions and statements evaluated by the runtime.
//!
//! Every name is resolved during lowering: property and callback references
//! point at an owner (an element of the flattened tree, or a global) and
//! locals are handler parameters or repeater variables.

use std::{fmt, rc::Rc};

use crate::compiler::langtype::{StructType, Type};
use crate::runtime::value::Value;

/// Where a property or callback lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Index into the component's element table. The root is element 0.
    Element(usize),
    /// Index into the component's global table.
    Global(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedReference {
    pub owner: Owner,
    pub name: String,
}

impl NamedReference {
    pub fn new(owner: Owner, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    Abs,
    Min,
    Max,
    Round,
    Floor,
    Ceil,
    Sqrt,
    Mod,
    Debug,
}

impl BuiltinFunction {
    pub fn lookup(name: &str) -> Option<Self> {
        let function = match name {
            "abs" => BuiltinFunction::Abs,
            "min" => BuiltinFunction::Min,
            "max" => BuiltinFunction::Max,
            "round" => BuiltinFunction::Round,
            "floor" => BuiltinFunction::Floor,
            "ceil" => BuiltinFunction::Ceil,
            "sqrt" => BuiltinFunction::Sqrt,
            "mod" => BuiltinFunction::Mod,
            "debug" => BuiltinFunction::Debug,
            _ => return None,
        };
        Some(function)
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinFunction::Abs => "abs",
            BuiltinFunction::Min => "min",
            BuiltinFunction::Max => "max",
            BuiltinFunction::Round => "round",
            BuiltinFunction::Floor => "floor",
            BuiltinFunction::Ceil => "ceil",
            BuiltinFunction::Sqrt => "sqrt",
            BuiltinFunction::Mod => "mod",
            BuiltinFunction::Debug => "debug",
        }
    }

    /// `(min, max)` argument count; `None` is unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            BuiltinFunction::Abs
            | BuiltinFunction::Round
            | BuiltinFunction::Floor
            | BuiltinFunction::Ceil
            | BuiltinFunction::Sqrt => (1, Some(1)),
            BuiltinFunction::Mod => (2, Some(2)),
            BuiltinFunction::Min | BuiltinFunction::Max => (1, None),
            BuiltinFunction::Debug => (0, None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_operator(operator: &str) -> Option<Self> {
        let op = match operator {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessEqual,
            ">=" => BinaryOp::GreaterEqual,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    Property(NamedReference),
    /// Handler parameter or repeater variable.
    Local(String),
    StructField {
        base: Box<Expr>,
        field: String,
        ty: Type,
    },
    ArrayLength(Box<Expr>),
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        element_ty: Type,
    },
    CallCallback {
        callback: NamedReference,
        arguments: Vec<Expr>,
    },
    CallBuiltin {
        function: BuiltinFunction,
        arguments: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        consequence: Box<Expr>,
        alternative: Box<Expr>,
    },
    Array(Vec<Expr>),
    Struct {
        ty: Rc<StructType>,
        fields: Vec<(String, Expr)>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Property(reference) => write!(f, "{}", reference),
            Expr::Local(name) => write!(f, "{}", name),
            Expr::StructField { base, field, .. } => write!(f, "{}.{}", base, field),
            Expr::ArrayLength(array) => write!(f, "{}.length", array),
            Expr::Index { array, index, .. } => write!(f, "{}[{}]", array, index),
            Expr::CallCallback {
                callback,
                arguments,
            } => write!(f, "{}({})", callback, join(arguments)),
            Expr::CallBuiltin {
                function,
                arguments,
            } => write!(f, "{}({})", function.name(), join(arguments)),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Negate => write!(f, "(-{})", operand),
                UnaryOp::Not => write!(f, "(!{})", operand),
            },
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expr::Conditional {
                condition,
                consequence,
                alternative,
            } => write!(f, "({} ? {} : {})", condition, consequence, alternative),
            Expr::Array(elements) => write!(f, "[{}]", join(elements)),
            Expr::Struct { fields, .. } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .collect();
                write!(f, "{{ {} }}", fields.join(", "))
            }
        }
    }
}

impl fmt::Display for NamedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Owner::Element(index) => write!(f, "#{}.{}", index, self.name),
            Owner::Global(index) => write!(f, "global#{}.{}", index, self.name),
        }
    }
}

fn join(expressions: &[Expr]) -> String {
    expressions
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),
    /// `target op= value`; `op` is `None` for plain `=`.
    Assign {
        target: NamedReference,
        op: Option<BinaryOp>,
        value: Expr,
    },
    If {
        condition: Expr,
        consequence: Vec<Stmt>,
        alternative: Vec<Stmt>,
    },
    Return(Option<Expr>),
}
