//! Top-level items and element members of a `.vel` document.

use std::fmt;

use crate::diagnostics::Span;

use super::Identifier;
use super::expression::Expression;
use super::statement::Block;

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub enum Item {
    Import(ImportDecl),
    Export(ExportList),
    Struct(StructDecl),
    Global(GlobalDecl),
    Component(ComponentDecl),
}

/// `X` or `X as Y` inside an import or export list.
#[derive(Debug, Clone)]
pub struct NameAlias {
    pub name: Identifier,
    pub alias: Option<Identifier>,
}

impl NameAlias {
    /// Name the item is known by after the import/export.
    pub fn visible_name(&self) -> &Identifier {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub names: Vec<NameAlias>,
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExportList {
    pub names: Vec<NameAlias>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub exported: bool,
    pub name: Identifier,
    pub fields: Vec<(Identifier, TypeExpr)>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct GlobalDecl {
    pub exported: bool,
    pub name: Identifier,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ComponentDecl {
    pub exported: bool,
    pub name: Identifier,
    pub base: Option<Identifier>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    In,
    Out,
    InOut,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self != Visibility::Private
    }

    pub fn host_writable(self) -> bool {
        matches!(self, Visibility::In | Visibility::InOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::In => "in",
            Visibility::Out => "out",
            Visibility::InOut => "in-out",
            Visibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeExpr {
    Named { name: Identifier, span: Span },
    Array { element: Box<TypeExpr>, span: Span },
    Struct { fields: Vec<(Identifier, TypeExpr)>, span: Span },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. }
            | TypeExpr::Array { span, .. }
            | TypeExpr::Struct { span, .. } => *span,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named { name, .. } => write!(f, "{}", name),
            TypeExpr::Array { element, .. } => write!(f, "[{}]", element),
            TypeExpr::Struct { fields, .. } => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{}: {}", name, ty))
                    .collect();
                write!(f, "{{ {} }}", parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Member {
    Property(PropertyDecl),
    Callback(CallbackDecl),
    Handler(HandlerDecl),
    Binding(BindingDecl),
    Element(ElementDecl),
    Repeater(RepeaterDecl),
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub visibility: Visibility,
    pub ty: TypeExpr,
    pub name: Identifier,
    pub binding: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallbackDecl {
    pub name: Identifier,
    pub parameters: Vec<TypeExpr>,
    pub return_type: Option<TypeExpr>,
    pub span: Span,
}

/// `name(a, b) => { ... }`
#[derive(Debug, Clone)]
pub struct HandlerDecl {
    pub name: Identifier,
    pub parameters: Vec<Identifier>,
    pub body: Block,
    pub span: Span,
}

/// `name: expr;`
#[derive(Debug, Clone)]
pub struct BindingDecl {
    pub name: Identifier,
    pub expression: Expression,
    pub span: Span,
}

/// `[id :=] Type { members }`
#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub id: Option<Identifier>,
    pub type_name: Identifier,
    pub members: Vec<Member>,
    pub span: Span,
}

/// `for item[index] in model : Type { members }`
#[derive(Debug, Clone)]
pub struct RepeaterDecl {
    pub item: Identifier,
    pub index: Option<Identifier>,
    pub model: Expression,
    pub element: ElementDecl,
    pub span: Span,
}
