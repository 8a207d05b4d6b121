//! Evaluation of lowered expressions and handler bodies against an instance.

use crate::compiler::expression_tree::{BinaryOp, BuiltinFunction, Expr, Stmt, UnaryOp};
use crate::runtime::{instance::InstanceInner, structs::Struct, value::Value};

/// Bindings of repeater variables and handler parameters, innermost last.
pub(crate) type Locals = Vec<(String, Value)>;

pub(crate) struct EvalContext<'a> {
    instance: &'a InstanceInner,
    locals: Locals,
    depth: usize,
}

enum Flow {
    Continue(Value),
    Return(Value),
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(instance: &'a InstanceInner, locals: Locals, depth: usize) -> Self {
        Self {
            instance,
            locals,
            depth,
        }
    }

    /// Run a handler body. The result is the value of `return`, else the
    /// value of the last expression statement.
    pub(crate) fn run_handler(&self, body: &[Stmt]) -> Value {
        match self.exec_block(body) {
            Flow::Continue(value) | Flow::Return(value) => value,
        }
    }

    fn exec_block(&self, body: &[Stmt]) -> Flow {
        let mut last = Value::Void;
        for statement in body {
            match self.exec(statement) {
                Flow::Return(value) => return Flow::Return(value),
                Flow::Continue(value) => last = value,
            }
        }
        Flow::Continue(last)
    }

    fn exec(&self, statement: &Stmt) -> Flow {
        match statement {
            Stmt::Expression(expr) => Flow::Continue(self.eval(expr)),
            Stmt::Assign { target, op, value } => {
                let rhs = self.eval(value);
                let value = match op {
                    Some(op) => {
                        let current = self.instance.read_property(target, &self.locals, self.depth);
                        binary(*op, current, rhs)
                    }
                    None => rhs,
                };
                // Rejections are logged by the write.
                let _ = self.instance.write_property(target, value);
                Flow::Continue(Value::Void)
            }
            Stmt::If {
                condition,
                consequence,
                alternative,
            } => {
                if self.eval(condition).as_bool().unwrap_or(false) {
                    self.exec_block(consequence)
                } else {
                    self.exec_block(alternative)
                }
            }
            Stmt::Return(value) => Flow::Return(value.as_ref().map(|v| self.eval(v)).unwrap_or_default()),
        }
    }

    pub(crate) fn eval(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(value) => value.clone(),
            Expr::Property(reference) => self.instance.read_property(reference, &self.locals, self.depth),
            Expr::Local(name) => self
                .locals
                .iter()
                .rev()
                .find(|(local, _)| local == name)
                .map(|(_, value)| value.clone())
                .unwrap_or_default(),
            Expr::StructField { base, field, ty } => match self.eval(base) {
                Value::Struct(s) => s.get_field(field).cloned().unwrap_or_else(|| ty.default_value()),
                _ => ty.default_value(),
            },
            Expr::ArrayLength(array) => {
                let count = self.eval(array).as_model().map_or(0, |model| model.row_count());
                Value::from(count)
            }
            Expr::Index {
                array,
                index,
                element_ty,
            } => {
                let array = self.eval(array);
                let index = self.eval(index).as_number().unwrap_or(-1.0);
                array
                    .as_model()
                    .filter(|_| index >= 0.0)
                    .and_then(|model| model.row_data(index as usize))
                    .unwrap_or_else(|| element_ty.default_value())
            }
            Expr::CallCallback {
                callback,
                arguments,
            } => {
                let arguments = arguments.iter().map(|a| self.eval(a)).collect();
                self.instance
                    .call_callback(callback, arguments, &self.locals, self.depth + 1)
            }
            Expr::CallBuiltin {
                function,
                arguments,
            } => {
                let arguments: Vec<Value> = arguments.iter().map(|a| self.eval(a)).collect();
                builtin(*function, &arguments)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand);
                match op {
                    UnaryOp::Negate => Value::Number(-operand.as_number().unwrap_or_default()),
                    UnaryOp::Not => Value::Bool(!operand.as_bool().unwrap_or_default()),
                }
            }
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => Value::Bool(self.truthy(lhs) && self.truthy(rhs)),
                BinaryOp::Or => Value::Bool(self.truthy(lhs) || self.truthy(rhs)),
                op => binary(*op, self.eval(lhs), self.eval(rhs)),
            },
            Expr::Conditional {
                condition,
                consequence,
                alternative,
            } => {
                if self.truthy(condition) {
                    self.eval(consequence)
                } else {
                    self.eval(alternative)
                }
            }
            Expr::Array(elements) => {
                let rows: Vec<Value> = elements.iter().map(|e| self.eval(e)).collect();
                Value::from(rows)
            }
            Expr::Struct { fields, .. } => Value::Struct(
                fields
                    .iter()
                    .map(|(name, value)| (name.as_str(), self.eval(value)))
                    .collect::<Struct>(),
            ),
        }
    }

    fn truthy(&self, expr: &Expr) -> bool {
        self.eval(expr).as_bool().unwrap_or(false)
    }
}

fn number(value: &Value) -> f64 {
    value.as_number().unwrap_or_default()
}

pub(crate) fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Value {
    match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ => Value::from(lhs.to_plain_string() + &rhs.to_plain_string()),
        },
        BinaryOp::Sub => Value::Number(number(&lhs) - number(&rhs)),
        BinaryOp::Mul => Value::Number(number(&lhs) * number(&rhs)),
        BinaryOp::Div => Value::Number(number(&lhs) / number(&rhs)),
        BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
            let ordering = match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let Some(ordering) = ordering else {
                return Value::Bool(false);
            };
            Value::Bool(match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::Greater => ordering.is_gt(),
                BinaryOp::LessEqual => ordering.is_le(),
                _ => ordering.is_ge(),
            })
        }
        BinaryOp::Equal => Value::Bool(lhs == rhs),
        BinaryOp::NotEqual => Value::Bool(lhs != rhs),
        BinaryOp::And => Value::Bool(lhs.as_bool().unwrap_or(false) && rhs.as_bool().unwrap_or(false)),
        BinaryOp::Or => Value::Bool(lhs.as_bool().unwrap_or(false) || rhs.as_bool().unwrap_or(false)),
    }
}

fn builtin(function: BuiltinFunction, arguments: &[Value]) -> Value {
    let first = arguments.first().map(number).unwrap_or_default();
    match function {
        BuiltinFunction::Abs => Value::Number(first.abs()),
        BuiltinFunction::Round => Value::Number(first.round()),
        BuiltinFunction::Floor => Value::Number(first.floor()),
        BuiltinFunction::Ceil => Value::Number(first.ceil()),
        BuiltinFunction::Sqrt => Value::Number(first.sqrt()),
        BuiltinFunction::Mod => {
            let divisor = arguments.get(1).map(number).unwrap_or_default();
            Value::Number(first % divisor)
        }
        BuiltinFunction::Min => Value::Number(arguments.iter().map(number).fold(f64::INFINITY, f64::min)),
        BuiltinFunction::Max => Value::Number(arguments.iter().map(number).fold(f64::NEG_INFINITY, f64::max)),
        BuiltinFunction::Debug => {
            let text: Vec<String> = arguments.iter().map(Value::to_plain_string).collect();
            log::info!("{}", text.join(" "));
            Value::Void
        }
    }
}
