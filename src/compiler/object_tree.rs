//! The flattened result of lowering one component.
//!
//! Sub-components are inlined: every element of every used component gets a
//! slot in [`CompiledComponent::elements`], with the main component's root at
//! index 0. Globals used anywhere in the tree get one slot each in
//! [`CompiledComponent::globals`].

use std::{path::PathBuf, rc::Rc};

use indexmap::IndexMap;

use crate::compiler::expression_tree::{Expr, Owner, Stmt};
use crate::compiler::langtype::Type;
use crate::syntax::document::Visibility;

#[derive(Debug)]
pub struct CompiledComponent {
    pub name: String,
    pub elements: Vec<ElementInfo>,
    pub globals: Vec<GlobalInfo>,
    /// Public global name → index into `globals`, in export order.
    pub exported_globals: IndexMap<String, usize>,
    pub source_path: Option<PathBuf>,
    pub style: String,
}

impl CompiledComponent {
    pub fn root(&self) -> &ElementInfo {
        &self.elements[0]
    }

    pub fn members(&self, owner: Owner) -> Option<&Members> {
        match owner {
            Owner::Element(index) => self.elements.get(index).map(|e| &e.members),
            Owner::Global(index) => self.globals.get(index).map(|g| &g.members),
        }
    }

    pub fn exported_global(&self, name: &str) -> Option<(usize, &GlobalInfo)> {
        let index = *self.exported_globals.get(name)?;
        self.globals.get(index).map(|global| (index, global))
    }
}

/// Properties and callbacks of an element or a global, in declaration order.
#[derive(Debug, Default)]
pub struct Members {
    pub properties: IndexMap<String, PropertyInfo>,
    pub callbacks: IndexMap<String, CallbackInfo>,
}

impl Members {
    pub fn declares(&self, name: &str) -> bool {
        self.properties.contains_key(name) || self.callbacks.contains_key(name)
    }

    /// Properties visible to host code.
    pub fn public_properties(&self) -> impl Iterator<Item = (&String, &PropertyInfo)> {
        self.properties
            .iter()
            .filter(|(_, info)| !info.builtin && info.visibility.is_public())
    }

    pub fn public_callbacks(&self) -> impl Iterator<Item = (&String, &CallbackInfo)> {
        self.callbacks.iter().filter(|(_, info)| !info.builtin)
    }
}

#[derive(Debug)]
pub struct PropertyInfo {
    pub ty: Type,
    pub visibility: Visibility,
    /// Provided by a builtin element rather than declared in source.
    pub builtin: bool,
    pub binding: Option<Rc<Expr>>,
}

#[derive(Debug)]
pub struct CallbackInfo {
    pub parameters: Vec<Type>,
    pub return_type: Type,
    pub builtin: bool,
    /// Default handler declared in source.
    pub handler: Option<Rc<HandlerInfo>>,
}

#[derive(Debug)]
pub struct HandlerInfo {
    pub parameters: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub struct ElementInfo {
    pub id: Option<String>,
    /// Type as written at the use site, e.g. `Button`.
    pub type_name: String,
    /// Builtin element at the bottom of the inheritance chain, e.g. `Rectangle`.
    pub base_type: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub members: Members,
    /// Nearest enclosing repeated element, this one included.
    pub template: Option<usize>,
    /// Set on the repeated element itself.
    pub repeater: Option<RepeaterInfo>,
}

#[derive(Debug)]
pub struct RepeaterInfo {
    /// Evaluated in the scope enclosing the repeated element.
    pub model: Expr,
    pub item: String,
    pub index: Option<String>,
}

#[derive(Debug)]
pub struct GlobalInfo {
    pub name: String,
    pub members: Members,
}
