use std::fmt;

use crate::diagnostics::Span;

use super::expression::Expression;

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Expression {
        expression: Expression,
        span: Span,
    },
    /// `target = value`, `target += value`, ... ; `operator` is the
    /// arithmetic part (`""` for plain assignment).
    Assign {
        target: Expression,
        operator: String,
        value: Expression,
        span: Span,
    },
    If {
        condition: Expression,
        consequence: Block,
        alternative: Option<Block>,
        span: Span,
    },
    Return {
        value: Option<Expression>,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Expression { span, .. }
            | Statement::Assign { span, .. }
            | Statement::If { span, .. }
            | Statement::Return { span, .. } => *span,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression { expression, .. } => write!(f, "{};", expression),
            Statement::Assign {
                target,
                operator,
                value,
                ..
            } => write!(f, "{} {}= {};", target, operator, value),
            Statement::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if {} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Statement::Return { value: Some(value), .. } => write!(f, "return {};", value),
            Statement::Return { value: None, .. } => write!(f, "return;"),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        if body.is_empty() {
            write!(f, "{{ }}")
        } else {
            write!(f, "{{ {} }}", body.join(" "))
        }
    }
}
