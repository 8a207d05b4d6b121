//! Lowers parsed documents into a [`CompiledComponent`].
//!
//! Lowering runs in two passes. The first walks the element tree of the main
//! component, inlining every sub-component it uses and declaring properties
//! and callbacks. Bindings, handlers and repeater models are queued as jobs
//! and resolved in the second pass, once every element and id exists.

use std::{collections::HashMap, path::Path, rc::Rc};

use indexmap::IndexMap;

use crate::compiler::builtins;
use crate::compiler::expression_tree::{
    BinaryOp, BuiltinFunction, Expr, NamedReference, Owner, Stmt, UnaryOp,
};
use crate::compiler::langtype::{StructType, Type};
use crate::compiler::loader::{ItemRef, LoadedDocument};
use crate::compiler::object_tree::{
    CallbackInfo, CompiledComponent, ElementInfo, GlobalInfo, HandlerInfo, Members, PropertyInfo,
    RepeaterInfo,
};
use crate::diagnostics::{
    Diagnostic, ErrorCode, Span,
    error_codes::{
        ARGUMENT_COUNT, DUPLICATE_DECLARATION, HANDLER_ARITY, IMAGE_LOAD, INVALID_OPERANDS,
        NOT_A_CALLBACK, NOT_ASSIGNABLE, NOT_CALLABLE, RECURSIVE_TYPE, TYPE_MISMATCH,
        UNKNOWN_ELEMENT, UNKNOWN_MEMBER, UNKNOWN_NAME, UNKNOWN_TYPE, UNSUPPORTED_SYNTAX,
    },
};
use crate::runtime::{brush::Color, image::Image, value::Value};
use crate::syntax::{
    Identifier,
    document::{
        CallbackDecl, ElementDecl, HandlerDecl, Item, Member, PropertyDecl, RepeaterDecl,
        TypeExpr, Visibility,
    },
    expression::{Expression, Unit},
    statement::Statement,
};

/// Lower `component` as the root of a new tree named `name`.
///
/// `exported_globals` are the globals the main document makes public; they
/// get a slot even when no element refers to them.
pub(crate) fn lower_component(
    docs: &[LoadedDocument],
    component: ItemRef,
    name: &str,
    exported_globals: &[(String, ItemRef)],
) -> (CompiledComponent, Vec<Diagnostic>) {
    let mut lowerer = Lowerer::new(docs);
    let root = lowerer.new_element(None, name.to_string(), None);
    let doc = component.doc;
    let span = match docs[doc].item(component.item) {
        Item::Component(decl) => decl.name.span,
        _ => Span::default(),
    };
    lowerer.instantiate(component, root, doc, span);

    let mut exported = IndexMap::new();
    for (name, item) in exported_globals {
        if let Some(index) = lowerer.global_slot(*item) {
            exported.insert(name.clone(), index);
        }
    }

    lowerer.run_jobs();
    log::debug!(
        "lowered {}: {} element(s), {} global(s)",
        name,
        lowerer.elements.len(),
        lowerer.globals.len()
    );

    let compiled = CompiledComponent {
        name: name.to_string(),
        elements: lowerer.elements,
        globals: lowerer.globals,
        exported_globals: exported,
        source_path: None,
        style: String::new(),
    };
    (compiled, lowerer.diagnostics)
}

struct Scope {
    doc: usize,
    parent: Option<usize>,
    /// What `root` refers to.
    root: Owner,
    ids: HashMap<String, usize>,
    locals: Vec<(String, Type)>,
}

#[derive(Clone, Copy)]
enum Job<'a> {
    Binding {
        owner: Owner,
        scope: usize,
        name: &'a Identifier,
        expression: &'a Expression,
    },
    Handler {
        owner: Owner,
        scope: usize,
        decl: &'a HandlerDecl,
    },
    Repeater {
        element: usize,
        scope: usize,
        template_scope: usize,
        decl: &'a RepeaterDecl,
    },
}

/// Name resolution result.
enum Resolved {
    Local(String, Type),
    Property(NamedReference, Type),
    Callback(NamedReference),
    Object(Owner),
    Builtin(BuiltinFunction),
}

/// Expression lowering context.
struct Ctx {
    scope: usize,
    /// What `self` refers to.
    current: Owner,
    locals: Vec<(String, Type)>,
    return_type: Type,
}

impl Ctx {
    fn new(scope: usize, current: Owner) -> Self {
        Self {
            scope,
            current,
            locals: Vec::new(),
            return_type: Type::Void,
        }
    }
}

struct Lowerer<'a> {
    docs: &'a [LoadedDocument],
    diagnostics: Vec<Diagnostic>,
    elements: Vec<ElementInfo>,
    globals: Vec<GlobalInfo>,
    global_slots: HashMap<ItemRef, usize>,
    struct_types: HashMap<ItemRef, Rc<StructType>>,
    scopes: Vec<Scope>,
    jobs: Vec<Job<'a>>,
    /// Components and structs being expanded, for recursion checks.
    expanding: Vec<ItemRef>,
}

impl<'a> Lowerer<'a> {
    fn new(docs: &'a [LoadedDocument]) -> Self {
        Self {
            docs,
            diagnostics: Vec::new(),
            elements: Vec::new(),
            globals: Vec::new(),
            global_slots: HashMap::new(),
            struct_types: HashMap::new(),
            scopes: Vec::new(),
            jobs: Vec::new(),
            expanding: Vec::new(),
        }
    }

    fn error(&mut self, doc: usize, entry: &'static ErrorCode, values: &[&str], span: Span) {
        let file = self.docs[doc].file.clone();
        self.diagnostics.push(Diagnostic::make(entry, values, file, span));
    }

    fn new_element(&mut self, id: Option<String>, type_name: String, parent: Option<usize>) -> usize {
        let index = self.elements.len();
        let template = parent.and_then(|p| self.elements[p].template);
        self.elements.push(ElementInfo {
            id,
            type_name,
            base_type: String::new(),
            parent,
            children: Vec::new(),
            members: Members::default(),
            template,
            repeater: None,
        });
        if let Some(parent) = parent {
            self.elements[parent].children.push(index);
        }
        index
    }

    fn new_scope(&mut self, doc: usize, parent: Option<usize>, root: Owner, locals: Vec<(String, Type)>) -> usize {
        self.scopes.push(Scope {
            doc,
            parent,
            root,
            ids: HashMap::new(),
            locals,
        });
        self.scopes.len() - 1
    }

    fn members(&self, owner: Owner) -> &Members {
        match owner {
            Owner::Element(index) => &self.elements[index].members,
            Owner::Global(index) => &self.globals[index].members,
        }
    }

    fn members_mut(&mut self, owner: Owner) -> &mut Members {
        match owner {
            Owner::Element(index) => &mut self.elements[index].members,
            Owner::Global(index) => &mut self.globals[index].members,
        }
    }

    // ---- tree construction ----

    /// Expand the component `item` into `element`: its base first, then its
    /// own members. `doc` and `span` locate the use site.
    fn instantiate(&mut self, item: ItemRef, element: usize, doc: usize, span: Span) {
        let docs = self.docs;
        let Item::Component(decl) = docs[item.doc].item(item.item) else {
            return;
        };
        if self.expanding.contains(&item) {
            self.error(doc, &RECURSIVE_TYPE, &[decl.name.as_str()], span);
            return;
        }
        self.expanding.push(item);
        let scope = self.new_scope(item.doc, None, Owner::Element(element), Vec::new());
        match &decl.base {
            Some(base) => self.apply_element_type(base.as_str(), item.doc, base.span, element),
            None => self.apply_builtin(element, builtins::EMPTY),
        }
        self.lower_members(&decl.members, element, scope);
        self.expanding.pop();
    }

    fn apply_element_type(&mut self, type_name: &str, doc: usize, span: Span, element: usize) {
        let docs = self.docs;
        match docs[doc].scope.get(type_name) {
            Some(&item) if matches!(docs[item.doc].item(item.item), Item::Component(_)) => {
                self.instantiate(item, element, doc, span);
            }
            Some(_) => self.error(doc, &UNKNOWN_ELEMENT, &[type_name], span),
            None if builtins::lookup(type_name).is_some() => self.apply_builtin(element, type_name),
            None => self.error(doc, &UNKNOWN_ELEMENT, &[type_name], span),
        }
    }

    fn apply_builtin(&mut self, element: usize, name: &str) {
        let Some(builtin) = builtins::lookup(name) else {
            return;
        };
        let info = &mut self.elements[element];
        info.base_type = builtin.name.to_string();
        for (property, ty) in builtin.properties {
            info.members
                .properties
                .entry(property.to_string())
                .or_insert(PropertyInfo {
                    ty,
                    visibility: Visibility::InOut,
                    builtin: true,
                    binding: None,
                });
        }
        for callback in builtin.callbacks {
            info.members
                .callbacks
                .entry(callback.to_string())
                .or_insert(CallbackInfo {
                    parameters: Vec::new(),
                    return_type: Type::Void,
                    builtin: true,
                    handler: None,
                });
        }
    }

    fn lower_members(&mut self, members: &'a [Member], element: usize, scope: usize) {
        let owner = Owner::Element(element);
        for member in members {
            match member {
                Member::Property(decl) => self.declare_property(owner, scope, decl),
                Member::Callback(decl) => self.declare_callback(owner, scope, decl),
                Member::Handler(decl) => self.jobs.push(Job::Handler { owner, scope, decl }),
                Member::Binding(decl) => self.jobs.push(Job::Binding {
                    owner,
                    scope,
                    name: &decl.name,
                    expression: &decl.expression,
                }),
                Member::Element(decl) => {
                    self.lower_element(decl, element, scope);
                }
                Member::Repeater(decl) => self.lower_repeater(decl, element, scope),
            }
        }
    }

    fn lower_element(&mut self, decl: &'a ElementDecl, parent: usize, scope: usize) -> usize {
        let id = decl.id.as_ref().map(|id| id.name.clone());
        let index = self.new_element(id, decl.type_name.name.clone(), Some(parent));
        let doc = self.scopes[scope].doc;
        if let Some(id) = &decl.id {
            if self.scopes[scope].ids.contains_key(id.as_str()) {
                self.error(doc, &DUPLICATE_DECLARATION, &[id.as_str()], id.span);
            } else {
                self.scopes[scope].ids.insert(id.name.clone(), index);
            }
        }
        self.apply_element_type(decl.type_name.as_str(), doc, decl.type_name.span, index);
        self.lower_members(&decl.members, index, scope);
        index
    }

    fn lower_repeater(&mut self, decl: &'a RepeaterDecl, parent: usize, scope: usize) {
        let doc = self.scopes[scope].doc;
        let root = self.scopes[scope].root;
        // The item type is known once the model expression is lowered.
        let mut locals = vec![(decl.item.name.clone(), Type::Void)];
        if let Some(index) = &decl.index {
            locals.push((index.name.clone(), Type::Int));
        }
        let template_scope = self.new_scope(doc, Some(scope), root, locals);

        let index = self.elements.len();
        self.elements.push(ElementInfo {
            id: None,
            type_name: String::new(),
            base_type: String::new(),
            parent: None,
            children: Vec::new(),
            members: Members::default(),
            template: Some(index),
            repeater: None,
        });
        self.fill_repeated_element(index, &decl.element, parent, template_scope);
        self.jobs.push(Job::Repeater {
            element: index,
            scope,
            template_scope,
            decl,
        });
    }

    fn fill_repeated_element(&mut self, index: usize, decl: &'a ElementDecl, parent: usize, scope: usize) {
        let doc = self.scopes[scope].doc;
        {
            let info = &mut self.elements[index];
            info.id = decl.id.as_ref().map(|id| id.name.clone());
            info.type_name = decl.type_name.name.clone();
            info.parent = Some(parent);
        }
        self.elements[parent].children.push(index);
        if let Some(id) = &decl.id {
            self.scopes[scope].ids.insert(id.name.clone(), index);
        }
        self.apply_element_type(decl.type_name.as_str(), doc, decl.type_name.span, index);
        self.lower_members(&decl.members, index, scope);
    }

    fn declare_property(&mut self, owner: Owner, scope: usize, decl: &'a PropertyDecl) {
        let doc = self.scopes[scope].doc;
        let Some(ty) = self.resolve_type(&decl.ty, doc) else {
            return;
        };
        if self.members(owner).declares(decl.name.as_str()) {
            self.error(doc, &DUPLICATE_DECLARATION, &[decl.name.as_str()], decl.name.span);
            return;
        }
        self.members_mut(owner).properties.insert(
            decl.name.name.clone(),
            PropertyInfo {
                ty,
                visibility: decl.visibility,
                builtin: false,
                binding: None,
            },
        );
        if let Some(expression) = &decl.binding {
            self.jobs.push(Job::Binding {
                owner,
                scope,
                name: &decl.name,
                expression,
            });
        }
    }

    fn declare_callback(&mut self, owner: Owner, scope: usize, decl: &'a CallbackDecl) {
        let doc = self.scopes[scope].doc;
        let mut parameters = Vec::with_capacity(decl.parameters.len());
        for parameter in &decl.parameters {
            parameters.push(self.resolve_type(parameter, doc).unwrap_or(Type::Void));
        }
        let return_type = match &decl.return_type {
            Some(ty) => self.resolve_type(ty, doc).unwrap_or(Type::Void),
            None => Type::Void,
        };
        if self.members(owner).declares(decl.name.as_str()) {
            self.error(doc, &DUPLICATE_DECLARATION, &[decl.name.as_str()], decl.name.span);
            return;
        }
        self.members_mut(owner).callbacks.insert(
            decl.name.name.clone(),
            CallbackInfo {
                parameters,
                return_type,
                builtin: false,
                handler: None,
            },
        );
    }

    /// Slot of the global `item`, lowering its declarations on first use.
    fn global_slot(&mut self, item: ItemRef) -> Option<usize> {
        if let Some(&index) = self.global_slots.get(&item) {
            return Some(index);
        }
        let docs = self.docs;
        let Item::Global(decl) = docs[item.doc].item(item.item) else {
            return None;
        };
        let index = self.globals.len();
        self.globals.push(GlobalInfo {
            name: decl.name.name.clone(),
            members: Members::default(),
        });
        self.global_slots.insert(item, index);

        let owner = Owner::Global(index);
        let scope = self.new_scope(item.doc, None, owner, Vec::new());
        for member in &decl.members {
            match member {
                Member::Property(decl) => self.declare_property(owner, scope, decl),
                Member::Callback(decl) => self.declare_callback(owner, scope, decl),
                Member::Handler(decl) => self.jobs.push(Job::Handler { owner, scope, decl }),
                Member::Binding(decl) => self.jobs.push(Job::Binding {
                    owner,
                    scope,
                    name: &decl.name,
                    expression: &decl.expression,
                }),
                Member::Element(ElementDecl { span, .. }) | Member::Repeater(RepeaterDecl { span, .. }) => {
                    self.error(item.doc, &UNSUPPORTED_SYNTAX, &["An element inside a global"], *span);
                }
            }
        }
        Some(index)
    }

    // ---- types ----

    fn resolve_type(&mut self, ty: &TypeExpr, doc: usize) -> Option<Type> {
        match ty {
            TypeExpr::Named { name, span } => {
                if let Some(ty) = Type::from_builtin_name(name.as_str()) {
                    return Some(ty);
                }
                let docs = self.docs;
                match docs[doc].scope.get(name.as_str()) {
                    Some(&item) if matches!(docs[item.doc].item(item.item), Item::Struct(_)) => {
                        self.struct_type(item, doc, *span).map(Type::Struct)
                    }
                    _ => {
                        self.error(doc, &UNKNOWN_TYPE, &[name.as_str()], *span);
                        None
                    }
                }
            }
            TypeExpr::Array { element, .. } => {
                Some(Type::Array(Box::new(self.resolve_type(element, doc)?)))
            }
            TypeExpr::Struct { fields, .. } => {
                let mut resolved = IndexMap::new();
                for (name, ty) in fields {
                    resolved.insert(name.name.clone(), self.resolve_type(ty, doc)?);
                }
                Some(Type::Struct(Rc::new(StructType {
                    name: None,
                    fields: resolved,
                })))
            }
        }
    }

    fn struct_type(&mut self, item: ItemRef, doc: usize, span: Span) -> Option<Rc<StructType>> {
        if let Some(ty) = self.struct_types.get(&item) {
            return Some(ty.clone());
        }
        let docs = self.docs;
        let Item::Struct(decl) = docs[item.doc].item(item.item) else {
            return None;
        };
        if self.expanding.contains(&item) {
            self.error(doc, &RECURSIVE_TYPE, &[decl.name.as_str()], span);
            return None;
        }
        self.expanding.push(item);
        let mut fields = IndexMap::new();
        let mut complete = true;
        for (name, ty) in &decl.fields {
            match self.resolve_type(ty, item.doc) {
                Some(ty) => {
                    fields.insert(name.name.clone(), ty);
                }
                None => complete = false,
            }
        }
        self.expanding.pop();
        if !complete {
            return None;
        }
        let ty = Rc::new(StructType {
            name: Some(decl.name.name.clone()),
            fields,
        });
        self.struct_types.insert(item, ty.clone());
        Some(ty)
    }

    // ---- jobs ----

    fn run_jobs(&mut self) {
        // Repeater models first: they type the item variables that bindings
        // inside the template read.
        let mut index = 0;
        while index < self.jobs.len() {
            if let Job::Repeater {
                element,
                scope,
                template_scope,
                decl,
            } = self.jobs[index]
            {
                self.lower_repeater_model(element, scope, template_scope, decl);
            }
            index += 1;
        }

        // Globals lowered on demand append jobs while this loop runs.
        let mut index = 0;
        while index < self.jobs.len() {
            match self.jobs[index] {
                Job::Binding {
                    owner,
                    scope,
                    name,
                    expression,
                } => self.lower_binding(owner, scope, name, expression),
                Job::Handler { owner, scope, decl } => self.lower_handler(owner, scope, decl),
                Job::Repeater { .. } => {}
            }
            index += 1;
        }
    }

    fn lower_repeater_model(&mut self, element: usize, scope: usize, template_scope: usize, decl: &RepeaterDecl) {
        let doc = self.scopes[scope].doc;
        let Some(parent) = self.elements[element].parent else {
            return;
        };
        let ctx = Ctx::new(scope, Owner::Element(parent));
        let Some((model, ty)) = self.lower_expression(&decl.model, &ctx) else {
            return;
        };
        let item_type = match ty {
            Type::Array(element) => *element,
            Type::Int | Type::Float => Type::Int,
            other => {
                self.error(doc, &TYPE_MISMATCH, &[&other.to_string(), "an array"], decl.model.span());
                return;
            }
        };
        self.scopes[template_scope].locals[0].1 = item_type;
        self.elements[element].repeater = Some(RepeaterInfo {
            model,
            item: decl.item.name.clone(),
            index: decl.index.as_ref().map(|i| i.name.clone()),
        });
    }

    fn lower_binding(&mut self, owner: Owner, scope: usize, name: &Identifier, expression: &Expression) {
        let doc = self.scopes[scope].doc;
        let members = self.members(owner);
        let ty = match members.properties.get(name.as_str()) {
            Some(property) => property.ty.clone(),
            None if members.callbacks.contains_key(name.as_str()) => {
                self.error(doc, &NOT_ASSIGNABLE, &[name.as_str()], name.span);
                return;
            }
            None => {
                self.error(doc, &UNKNOWN_NAME, &[name.as_str()], name.span);
                return;
            }
        };
        let ctx = Ctx::new(scope, owner);
        let Some((expr, expr_type)) = self.lower_expression(expression, &ctx) else {
            return;
        };
        if !ty.accepts(&expr_type) {
            self.error(
                doc,
                &TYPE_MISMATCH,
                &[&expr_type.to_string(), &ty.to_string()],
                expression.span(),
            );
            return;
        }
        if let Some(property) = self.members_mut(owner).properties.get_mut(name.as_str()) {
            property.binding = Some(Rc::new(expr));
        }
    }

    fn lower_handler(&mut self, owner: Owner, scope: usize, decl: &HandlerDecl) {
        let doc = self.scopes[scope].doc;
        let name = decl.name.as_str();
        let members = self.members(owner);
        let (parameters, return_type) = match members.callbacks.get(name) {
            Some(callback) => (callback.parameters.clone(), callback.return_type.clone()),
            None if members.properties.contains_key(name) => {
                self.error(doc, &NOT_A_CALLBACK, &[name], decl.name.span);
                return;
            }
            None => {
                self.error(doc, &UNKNOWN_NAME, &[name], decl.name.span);
                return;
            }
        };
        if decl.parameters.len() > parameters.len() {
            self.error(
                doc,
                &HANDLER_ARITY,
                &[name, &parameters.len().to_string(), &decl.parameters.len().to_string()],
                decl.name.span,
            );
            return;
        }
        let mut ctx = Ctx::new(scope, owner);
        ctx.locals = decl
            .parameters
            .iter()
            .zip(parameters)
            .map(|(name, ty)| (name.name.clone(), ty))
            .collect();
        ctx.return_type = return_type;
        let body = self.lower_block(&decl.body.statements, &ctx);
        let handler = HandlerInfo {
            parameters: decl.parameters.iter().map(|p| p.name.clone()).collect(),
            body,
        };
        if let Some(callback) = self.members_mut(owner).callbacks.get_mut(name) {
            callback.handler = Some(Rc::new(handler));
        }
    }

    // ---- names ----

    fn member_ref(&self, owner: Owner, name: &str) -> Option<Resolved> {
        let members = self.members(owner);
        if let Some(property) = members.properties.get(name) {
            return Some(Resolved::Property(NamedReference::new(owner, name), property.ty.clone()));
        }
        if members.callbacks.contains_key(name) {
            return Some(Resolved::Callback(NamedReference::new(owner, name)));
        }
        None
    }

    fn resolve_name(&mut self, name: &str, ctx: &Ctx) -> Option<Resolved> {
        match name {
            "self" => return Some(Resolved::Object(ctx.current)),
            "root" => return Some(Resolved::Object(self.scopes[ctx.scope].root)),
            "parent" => {
                if let Owner::Element(index) = ctx.current {
                    if let Some(parent) = self.elements[index].parent {
                        return Some(Resolved::Object(Owner::Element(parent)));
                    }
                }
            }
            _ => {}
        }

        if let Some((local, ty)) = ctx.locals.iter().rev().find(|(n, _)| n == name) {
            return Some(Resolved::Local(local.clone(), ty.clone()));
        }
        let mut scope = Some(ctx.scope);
        while let Some(index) = scope {
            let current = &self.scopes[index];
            if let Some((local, ty)) = current.locals.iter().find(|(n, _)| n == name) {
                return Some(Resolved::Local(local.clone(), ty.clone()));
            }
            if let Some(&element) = current.ids.get(name) {
                return Some(Resolved::Object(Owner::Element(element)));
            }
            scope = current.parent;
        }

        // Members of `self`, then of its ancestors up to the component root.
        let root = self.scopes[ctx.scope].root;
        let mut owner = Some(ctx.current);
        while let Some(current) = owner {
            if let Some(resolved) = self.member_ref(current, name) {
                return Some(resolved);
            }
            if current == root {
                break;
            }
            owner = match current {
                Owner::Element(index) => self.elements[index].parent.map(Owner::Element),
                Owner::Global(_) => None,
            };
        }

        let docs = self.docs;
        let doc = self.scopes[ctx.scope].doc;
        if let Some(&item) = docs[doc].scope.get(name) {
            if let Some(index) = self.global_slot(item) {
                return Some(Resolved::Object(Owner::Global(index)));
            }
        }

        BuiltinFunction::lookup(name).map(Resolved::Builtin)
    }

    // ---- expressions ----

    fn lower_expression(&mut self, expression: &Expression, ctx: &Ctx) -> Option<(Expr, Type)> {
        let doc = self.scopes[ctx.scope].doc;
        match expression {
            Expression::Identifier { name, span } => match self.resolve_name(name.as_str(), ctx) {
                Some(Resolved::Local(local, ty)) => Some((Expr::Local(local), ty)),
                Some(Resolved::Property(reference, ty)) => Some((Expr::Property(reference), ty)),
                Some(Resolved::Callback(_)) => {
                    self.error(doc, &UNSUPPORTED_SYNTAX, &["Using a callback as a value"], *span);
                    None
                }
                Some(Resolved::Object(_)) => {
                    self.error(
                        doc,
                        &UNSUPPORTED_SYNTAX,
                        &["Using an element or global as a value"],
                        *span,
                    );
                    None
                }
                Some(Resolved::Builtin(_)) => {
                    self.error(doc, &UNSUPPORTED_SYNTAX, &["Using a function as a value"], *span);
                    None
                }
                None => {
                    self.error(doc, &UNKNOWN_NAME, &[name.as_str()], *span);
                    None
                }
            },
            Expression::Number { value, unit, .. } => {
                let (value, ty) = number_literal(*value, *unit);
                Some((Expr::Literal(Value::Number(value)), ty))
            }
            Expression::String { value, .. } => Some((Expr::Literal(Value::from(value.as_str())), Type::String)),
            Expression::Boolean { value, .. } => Some((Expr::Literal(Value::Bool(*value)), Type::Bool)),
            Expression::Color { argb, .. } => Some((
                Expr::Literal(Value::from(Color::from_argb_encoded(*argb))),
                Type::Color,
            )),
            Expression::ImageUrl { path, span } => {
                let resolved = match &self.docs[doc].dir {
                    Some(dir) if !Path::new(path).is_absolute() => dir.join(path),
                    _ => Path::new(path).to_path_buf(),
                };
                match Image::load_from_path(&resolved) {
                    Ok(image) => Some((Expr::Literal(Value::Image(image)), Type::Image)),
                    Err(err) => {
                        let reason = err.to_string();
                        self.error(doc, &IMAGE_LOAD, &[path, &reason], *span);
                        None
                    }
                }
            }
            Expression::Array { elements, .. } => {
                let mut lowered = Vec::with_capacity(elements.len());
                let mut element_type = Type::Void;
                for (position, element) in elements.iter().enumerate() {
                    let (expr, ty) = self.lower_expression(element, ctx)?;
                    element_type = if position == 0 {
                        ty
                    } else {
                        match unify(&element_type, &ty) {
                            Some(ty) => ty,
                            None => {
                                self.error(
                                    doc,
                                    &TYPE_MISMATCH,
                                    &[&ty.to_string(), &element_type.to_string()],
                                    element.span(),
                                );
                                return None;
                            }
                        }
                    };
                    lowered.push(expr);
                }
                Some((Expr::Array(lowered), Type::Array(Box::new(element_type))))
            }
            Expression::StructLiteral { fields, .. } => {
                let mut lowered = Vec::with_capacity(fields.len());
                let mut types = IndexMap::new();
                for (name, value) in fields {
                    let (expr, ty) = self.lower_expression(value, ctx)?;
                    types.insert(name.name.clone(), ty);
                    lowered.push((name.name.clone(), expr));
                }
                let ty = Rc::new(StructType {
                    name: None,
                    fields: types,
                });
                Some((
                    Expr::Struct {
                        ty: ty.clone(),
                        fields: lowered,
                    },
                    Type::Struct(ty),
                ))
            }
            Expression::Member { object, member, .. } => self.lower_member(object, member, ctx),
            Expression::Index { left, index, .. } => {
                let (array, array_type) = self.lower_expression(left, ctx)?;
                let (index_expr, index_type) = self.lower_expression(index, ctx)?;
                let Type::Array(element_type) = array_type else {
                    self.error(doc, &TYPE_MISMATCH, &[&array_type.to_string(), "an array"], left.span());
                    return None;
                };
                if !index_type.is_numeric() {
                    self.error(doc, &TYPE_MISMATCH, &[&index_type.to_string(), "int"], index.span());
                    return None;
                }
                Some((
                    Expr::Index {
                        array: Box::new(array),
                        index: Box::new(index_expr),
                        element_ty: (*element_type).clone(),
                    },
                    *element_type,
                ))
            }
            Expression::Call {
                function,
                arguments,
                span,
            } => self.lower_call(function, arguments, *span, ctx),
            Expression::Prefix {
                operator, right, ..
            } => {
                let (operand, ty) = self.lower_expression(right, ctx)?;
                let op = match operator.as_str() {
                    "-" if ty.is_numeric() => UnaryOp::Negate,
                    "!" if ty == Type::Bool => UnaryOp::Not,
                    "-" => {
                        self.error(doc, &TYPE_MISMATCH, &[&ty.to_string(), "a number"], right.span());
                        return None;
                    }
                    _ => {
                        self.error(doc, &TYPE_MISMATCH, &[&ty.to_string(), "bool"], right.span());
                        return None;
                    }
                };
                Some((
                    Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    ty,
                ))
            }
            Expression::Infix {
                left,
                operator,
                right,
                span,
            } => {
                let (lhs, lhs_type) = self.lower_expression(left, ctx)?;
                let (rhs, rhs_type) = self.lower_expression(right, ctx)?;
                let Some(op) = BinaryOp::from_operator(operator) else {
                    self.error(doc, &UNSUPPORTED_SYNTAX, &[&format!("Operator `{}`", operator)], *span);
                    return None;
                };
                let Some(ty) = binary_result_type(op, &lhs_type, &rhs_type) else {
                    self.error(
                        doc,
                        &INVALID_OPERANDS,
                        &[operator, &lhs_type.to_string(), &rhs_type.to_string()],
                        *span,
                    );
                    return None;
                };
                Some((
                    Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ty,
                ))
            }
            Expression::Conditional {
                condition,
                consequence,
                alternative,
                ..
            } => {
                let (condition_expr, condition_type) = self.lower_expression(condition, ctx)?;
                if condition_type != Type::Bool {
                    self.error(
                        doc,
                        &TYPE_MISMATCH,
                        &[&condition_type.to_string(), "bool"],
                        condition.span(),
                    );
                    return None;
                }
                let (then_expr, then_type) = self.lower_expression(consequence, ctx)?;
                let (else_expr, else_type) = self.lower_expression(alternative, ctx)?;
                let Some(ty) = unify(&then_type, &else_type) else {
                    self.error(
                        doc,
                        &TYPE_MISMATCH,
                        &[&else_type.to_string(), &then_type.to_string()],
                        alternative.span(),
                    );
                    return None;
                };
                Some((
                    Expr::Conditional {
                        condition: Box::new(condition_expr),
                        consequence: Box::new(then_expr),
                        alternative: Box::new(else_expr),
                    },
                    ty,
                ))
            }
        }
    }

    fn lower_member(
        &mut self,
        object: &Expression,
        member: &Identifier,
        ctx: &Ctx,
    ) -> Option<(Expr, Type)> {
        let doc = self.scopes[ctx.scope].doc;
        if let Expression::Identifier { name, .. } = object {
            if let Some(Resolved::Object(owner)) = self.resolve_name(name.as_str(), ctx) {
                return match self.member_ref(owner, member.as_str()) {
                    Some(Resolved::Property(reference, ty)) => Some((Expr::Property(reference), ty)),
                    Some(_) => {
                        self.error(doc, &UNSUPPORTED_SYNTAX, &["Using a callback as a value"], member.span);
                        None
                    }
                    None => {
                        self.error(doc, &UNKNOWN_MEMBER, &[name.as_str(), member.as_str()], member.span);
                        None
                    }
                };
            }
        }

        let (base, ty) = self.lower_expression(object, ctx)?;
        match &ty {
            Type::Struct(st) => match st.fields.get(member.as_str()) {
                Some(field_type) => Some((
                    Expr::StructField {
                        base: Box::new(base),
                        field: member.name.clone(),
                        ty: field_type.clone(),
                    },
                    field_type.clone(),
                )),
                None => {
                    self.error(doc, &UNKNOWN_MEMBER, &[&ty.to_string(), member.as_str()], member.span);
                    None
                }
            },
            Type::Array(_) if member.as_str() == "length" => {
                Some((Expr::ArrayLength(Box::new(base)), Type::Int))
            }
            _ => {
                self.error(doc, &UNKNOWN_MEMBER, &[&ty.to_string(), member.as_str()], member.span);
                None
            }
        }
    }

    fn lower_call(
        &mut self,
        function: &Expression,
        arguments: &[Expression],
        span: Span,
        ctx: &Ctx,
    ) -> Option<(Expr, Type)> {
        let doc = self.scopes[ctx.scope].doc;
        let label = function.to_string();
        let target = match function {
            Expression::Identifier { name, .. } => match self.resolve_name(name.as_str(), ctx) {
                Some(resolved) => resolved,
                None => {
                    self.error(doc, &UNKNOWN_NAME, &[name.as_str()], function.span());
                    return None;
                }
            },
            Expression::Member { object, member, .. } => {
                let owner = match object.as_ref() {
                    Expression::Identifier { name, .. } => match self.resolve_name(name.as_str(), ctx) {
                        Some(Resolved::Object(owner)) => Some(owner),
                        _ => None,
                    },
                    _ => None,
                };
                let Some(owner) = owner else {
                    self.error(doc, &NOT_CALLABLE, &[&label], function.span());
                    return None;
                };
                match self.member_ref(owner, member.as_str()) {
                    Some(resolved) => resolved,
                    None => {
                        let object = object.to_string();
                        self.error(doc, &UNKNOWN_MEMBER, &[&object, member.as_str()], member.span);
                        return None;
                    }
                }
            }
            _ => {
                self.error(doc, &NOT_CALLABLE, &[&label], function.span());
                return None;
            }
        };

        match target {
            Resolved::Callback(reference) => {
                let callback = &self.members(reference.owner).callbacks[reference.name.as_str()];
                let parameters = callback.parameters.clone();
                let return_type = callback.return_type.clone();
                if arguments.len() != parameters.len() {
                    self.error(
                        doc,
                        &ARGUMENT_COUNT,
                        &[&label, &parameters.len().to_string(), &arguments.len().to_string()],
                        span,
                    );
                    return None;
                }
                let mut lowered = Vec::with_capacity(arguments.len());
                for (argument, parameter) in arguments.iter().zip(&parameters) {
                    let (expr, ty) = self.lower_expression(argument, ctx)?;
                    if !parameter.accepts(&ty) {
                        self.error(
                            doc,
                            &TYPE_MISMATCH,
                            &[&ty.to_string(), &parameter.to_string()],
                            argument.span(),
                        );
                        return None;
                    }
                    lowered.push(expr);
                }
                Some((
                    Expr::CallCallback {
                        callback: reference,
                        arguments: lowered,
                    },
                    return_type,
                ))
            }
            Resolved::Builtin(builtin) => self.lower_builtin_call(builtin, arguments, span, ctx),
            Resolved::Local(..) | Resolved::Property(..) | Resolved::Object(_) => {
                self.error(doc, &NOT_CALLABLE, &[&label], function.span());
                None
            }
        }
    }

    fn lower_builtin_call(
        &mut self,
        function: BuiltinFunction,
        arguments: &[Expression],
        span: Span,
        ctx: &Ctx,
    ) -> Option<(Expr, Type)> {
        let doc = self.scopes[ctx.scope].doc;
        let (min, max) = function.arity();
        if arguments.len() < min || max.is_some_and(|max| arguments.len() > max) {
            let expected = match max {
                Some(max) if max == min => min.to_string(),
                _ => format!("at least {}", min),
            };
            self.error(
                doc,
                &ARGUMENT_COUNT,
                &[function.name(), &expected, &arguments.len().to_string()],
                span,
            );
            return None;
        }

        let mut lowered = Vec::with_capacity(arguments.len());
        let mut types = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let (expr, ty) = self.lower_expression(argument, ctx)?;
            if function != BuiltinFunction::Debug && !ty.is_numeric() {
                self.error(doc, &TYPE_MISMATCH, &[&ty.to_string(), "a number"], argument.span());
                return None;
            }
            lowered.push(expr);
            types.push(ty);
        }

        let ty = match function {
            BuiltinFunction::Debug => Type::Void,
            BuiltinFunction::Sqrt => Type::Float,
            BuiltinFunction::Round | BuiltinFunction::Floor | BuiltinFunction::Ceil => match &types[0] {
                Type::Float => Type::Int,
                other => other.clone(),
            },
            BuiltinFunction::Abs | BuiltinFunction::Mod => types[0].clone(),
            BuiltinFunction::Min | BuiltinFunction::Max => {
                let mut ty = types[0].clone();
                for next in &types[1..] {
                    match unify(&ty, next) {
                        Some(unified) => ty = unified,
                        None => {
                            self.error(
                                doc,
                                &INVALID_OPERANDS,
                                &[function.name(), &ty.to_string(), &next.to_string()],
                                span,
                            );
                            return None;
                        }
                    }
                }
                ty
            }
        };
        Some((
            Expr::CallBuiltin {
                function,
                arguments: lowered,
            },
            ty,
        ))
    }

    // ---- statements ----

    fn lower_block(&mut self, statements: &[Statement], ctx: &Ctx) -> Vec<Stmt> {
        statements
            .iter()
            .filter_map(|statement| self.lower_statement(statement, ctx))
            .collect()
    }

    fn lower_statement(&mut self, statement: &Statement, ctx: &Ctx) -> Option<Stmt> {
        let doc = self.scopes[ctx.scope].doc;
        match statement {
            Statement::Expression { expression, .. } => {
                let (expr, _) = self.lower_expression(expression, ctx)?;
                Some(Stmt::Expression(expr))
            }
            Statement::Assign {
                target,
                operator,
                value,
                span,
            } => {
                let (reference, target_type) = self.assignment_target(target, ctx)?;
                let (value_expr, value_type) = self.lower_expression(value, ctx)?;
                let op = if operator.is_empty() {
                    None
                } else {
                    BinaryOp::from_operator(operator)
                };
                let result_type = match op {
                    Some(op) => match binary_result_type(op, &target_type, &value_type) {
                        Some(ty) => ty,
                        None => {
                            self.error(
                                doc,
                                &INVALID_OPERANDS,
                                &[&format!("{}=", operator), &target_type.to_string(), &value_type.to_string()],
                                *span,
                            );
                            return None;
                        }
                    },
                    None => value_type,
                };
                if !target_type.accepts(&result_type) {
                    self.error(
                        doc,
                        &TYPE_MISMATCH,
                        &[&result_type.to_string(), &target_type.to_string()],
                        value.span(),
                    );
                    return None;
                }
                Some(Stmt::Assign {
                    target: reference,
                    op,
                    value: value_expr,
                })
            }
            Statement::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                let (condition_expr, condition_type) = self.lower_expression(condition, ctx)?;
                if condition_type != Type::Bool {
                    self.error(
                        doc,
                        &TYPE_MISMATCH,
                        &[&condition_type.to_string(), "bool"],
                        condition.span(),
                    );
                    return None;
                }
                let consequence = self.lower_block(&consequence.statements, ctx);
                let alternative = match alternative {
                    Some(block) => self.lower_block(&block.statements, ctx),
                    None => Vec::new(),
                };
                Some(Stmt::If {
                    condition: condition_expr,
                    consequence,
                    alternative,
                })
            }
            Statement::Return { value, span } => match value {
                Some(value) => {
                    let (expr, ty) = self.lower_expression(value, ctx)?;
                    if !ctx.return_type.accepts(&ty) {
                        self.error(
                            doc,
                            &TYPE_MISMATCH,
                            &[&ty.to_string(), &ctx.return_type.to_string()],
                            *span,
                        );
                        return None;
                    }
                    Some(Stmt::Return(Some(expr)))
                }
                None => Some(Stmt::Return(None)),
            },
        }
    }

    fn assignment_target(&mut self, target: &Expression, ctx: &Ctx) -> Option<(NamedReference, Type)> {
        let doc = self.scopes[ctx.scope].doc;
        let resolved = match target {
            Expression::Identifier { name, span } => match self.resolve_name(name.as_str(), ctx) {
                Some(resolved) => resolved,
                None => {
                    self.error(doc, &UNKNOWN_NAME, &[name.as_str()], *span);
                    return None;
                }
            },
            Expression::Member { object, member, .. } => {
                let owner = match object.as_ref() {
                    Expression::Identifier { name, .. } => match self.resolve_name(name.as_str(), ctx) {
                        Some(Resolved::Object(owner)) => Some(owner),
                        _ => None,
                    },
                    _ => None,
                };
                match owner.and_then(|owner| self.member_ref(owner, member.as_str())) {
                    Some(resolved) => resolved,
                    None => {
                        let text = target.to_string();
                        self.error(doc, &NOT_ASSIGNABLE, &[&text], target.span());
                        return None;
                    }
                }
            }
            _ => {
                let text = target.to_string();
                self.error(doc, &NOT_ASSIGNABLE, &[&text], target.span());
                return None;
            }
        };
        match resolved {
            Resolved::Property(reference, ty) => Some((reference, ty)),
            _ => {
                let text = target.to_string();
                self.error(doc, &NOT_ASSIGNABLE, &[&text], target.span());
                None
            }
        }
    }
}

/// Canonical value and type of a number literal: lengths in px, durations
/// in ms, angles in degrees.
fn number_literal(value: f64, unit: Unit) -> (f64, Type) {
    match unit {
        Unit::None => (value, Type::Float),
        Unit::Px => (value, Type::Length),
        Unit::Pt => (value * 4.0 / 3.0, Type::Length),
        Unit::Ms => (value, Type::Duration),
        Unit::S => (value * 1000.0, Type::Duration),
        Unit::Deg => (value, Type::Angle),
        Unit::Rad => (value.to_degrees(), Type::Angle),
        Unit::Turn => (value * 360.0, Type::Angle),
        Unit::Percent => (value, Type::Percent),
    }
}

/// The type both `a` and `b` convert to, preferring the wider one.
fn unify(a: &Type, b: &Type) -> Option<Type> {
    if a == b {
        return Some(a.clone());
    }
    match (a, b) {
        (Type::Int, Type::Float) | (Type::Float, Type::Int) => Some(Type::Float),
        (Type::Color, Type::Brush) | (Type::Brush, Type::Color) => Some(Type::Brush),
        _ if a.accepts(b) => Some(a.clone()),
        _ if b.accepts(a) => Some(b.clone()),
        _ => None,
    }
}

/// Result type of arithmetic on two numbers; units must agree.
fn numeric_result(lhs: &Type, rhs: &Type) -> Option<Type> {
    if !lhs.is_numeric() || !rhs.is_numeric() {
        return None;
    }
    match (lhs.is_unit(), rhs.is_unit()) {
        (true, true) => (lhs == rhs).then(|| lhs.clone()),
        (true, false) => Some(lhs.clone()),
        (false, true) => Some(rhs.clone()),
        (false, false) if *lhs == Type::Int && *rhs == Type::Int => Some(Type::Int),
        (false, false) => Some(Type::Float),
    }
}

fn binary_result_type(op: BinaryOp, lhs: &Type, rhs: &Type) -> Option<Type> {
    let printable = |ty: &Type| ty.is_numeric() || matches!(ty, Type::String | Type::Bool);
    match op {
        BinaryOp::And | BinaryOp::Or => {
            (*lhs == Type::Bool && *rhs == Type::Bool).then_some(Type::Bool)
        }
        BinaryOp::Equal | BinaryOp::NotEqual => {
            (lhs.accepts(rhs) || rhs.accepts(lhs)).then_some(Type::Bool)
        }
        BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
            let comparable = numeric_result(lhs, rhs).is_some()
                || (*lhs == Type::String && *rhs == Type::String);
            comparable.then_some(Type::Bool)
        }
        BinaryOp::Add if *lhs == Type::String || *rhs == Type::String => {
            (printable(lhs) && printable(rhs)).then_some(Type::String)
        }
        BinaryOp::Add | BinaryOp::Sub => numeric_result(lhs, rhs),
        BinaryOp::Mul => {
            if !lhs.is_numeric() || !rhs.is_numeric() {
                return None;
            }
            match (lhs.is_unit(), rhs.is_unit()) {
                (true, true) => None,
                _ => numeric_result(lhs, rhs),
            }
        }
        BinaryOp::Div => {
            if !lhs.is_numeric() || !rhs.is_numeric() {
                return None;
            }
            match (lhs.is_unit(), rhs.is_unit()) {
                (true, true) => (lhs == rhs).then_some(Type::Float),
                (true, false) => Some(lhs.clone()),
                (false, true) => None,
                (false, false) => Some(Type::Float),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_are_canonicalized() {
        assert_eq!(number_literal(2.0, Unit::S), (2000.0, Type::Duration));
        assert_eq!(number_literal(3.0, Unit::Pt), (4.0, Type::Length));
        assert_eq!(number_literal(0.5, Unit::Turn), (180.0, Type::Angle));
        assert_eq!(number_literal(50.0, Unit::Percent), (50.0, Type::Percent));
    }

    #[test]
    fn arithmetic_keeps_units() {
        assert_eq!(binary_result_type(BinaryOp::Add, &Type::Length, &Type::Float), Some(Type::Length));
        assert_eq!(binary_result_type(BinaryOp::Add, &Type::Length, &Type::Duration), None);
        assert_eq!(binary_result_type(BinaryOp::Div, &Type::Length, &Type::Length), Some(Type::Float));
        assert_eq!(binary_result_type(BinaryOp::Mul, &Type::Int, &Type::Int), Some(Type::Int));
        assert_eq!(binary_result_type(BinaryOp::Div, &Type::Int, &Type::Int), Some(Type::Float));
        assert_eq!(binary_result_type(BinaryOp::Mul, &Type::Length, &Type::Length), None);
    }

    #[test]
    fn string_concatenation_accepts_numbers() {
        assert_eq!(binary_result_type(BinaryOp::Add, &Type::String, &Type::Int), Some(Type::String));
        assert_eq!(binary_result_type(BinaryOp::Sub, &Type::String, &Type::Int), None);
        assert_eq!(binary_result_type(BinaryOp::Less, &Type::String, &Type::String), Some(Type::Bool));
    }

    #[test]
    fn unify_prefers_float_over_int() {
        assert_eq!(unify(&Type::Int, &Type::Float), Some(Type::Float));
        assert_eq!(unify(&Type::String, &Type::Bool), None);
        assert_eq!(unify(&Type::Color, &Type::Brush), Some(Type::Brush));
    }
}
