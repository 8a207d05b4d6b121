//! Live component instances.
//!
//! An instance owns one slot per property and callback of every element in
//! the flattened tree, plus one set per global. Host code only reaches the
//! public members of the root element and of exported globals.
//!
//! Properties with a binding are evaluated on every read until something
//! assigns them. No `RefCell` borrow is held while a binding is evaluated or
//! a handler runs, so both may re-enter the instance.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    hash::Hash,
    rc::{Rc, Weak},
};

use crate::compiler::{
    expression_tree::{NamedReference, Owner},
    langtype::Type,
    object_tree::{CallbackInfo, CompiledComponent, Members, PropertyInfo},
};
use crate::runtime::{
    callback::CallbackHandler,
    definition::ComponentDefinition,
    errors::{CallbackError, PropertyError},
    eval::{EvalContext, Locals},
    event_loop::{self, EventLoopError},
    leak_detector,
    model::{ModelCache, ModelRc},
    scene::{self, SceneNode},
    thread::ThreadAffinity,
    value::Value,
    window::Window,
};
use crate::syntax::normalize_name;

/// Nesting limit for bindings and callbacks calling each other.
const MAX_DEPTH: usize = 256;

struct PropertySlot {
    value: RefCell<Value>,
    has_binding: Cell<bool>,
    evaluating: Cell<bool>,
    /// Set when the binding read itself during the current evaluation.
    looped: Cell<bool>,
}

#[derive(Default)]
struct CallbackSlot {
    handler: RefCell<Option<Rc<dyn CallbackHandler>>>,
}

struct OwnerState {
    properties: HashMap<String, PropertySlot>,
    callbacks: HashMap<String, CallbackSlot>,
}

impl OwnerState {
    fn new(members: &Members) -> Self {
        let properties = members
            .properties
            .iter()
            .map(|(name, info)| {
                let slot = PropertySlot {
                    value: RefCell::new(info.ty.default_value()),
                    has_binding: Cell::new(info.binding.is_some()),
                    evaluating: Cell::new(false),
                    looped: Cell::new(false),
                };
                (name.clone(), slot)
            })
            .collect();
        let callbacks = members
            .callbacks
            .keys()
            .map(|name| (name.clone(), CallbackSlot::default()))
            .collect();
        Self {
            properties,
            callbacks,
        }
    }
}

pub(crate) struct InstanceInner {
    definition: ComponentDefinition,
    elements: Vec<OwnerState>,
    globals: Vec<OwnerState>,
    window: Window,
    property_caches: RefCell<HashMap<String, Rc<ModelCache>>>,
    repeater_caches: RefCell<HashMap<usize, Rc<ModelCache>>>,
    affinity: ThreadAffinity,
}

impl InstanceInner {
    pub(crate) fn compiled(&self) -> &CompiledComponent {
        self.definition.compiled()
    }

    fn state(&self, owner: Owner) -> Option<&OwnerState> {
        match owner {
            Owner::Element(index) => self.elements.get(index),
            Owner::Global(index) => self.globals.get(index),
        }
    }

    fn property(&self, reference: &NamedReference) -> Option<(&PropertySlot, &PropertyInfo)> {
        let slot = self.state(reference.owner)?.properties.get(&reference.name)?;
        let info = self
            .compiled()
            .members(reference.owner)?
            .properties
            .get(&reference.name)?;
        Some((slot, info))
    }

    fn callback(&self, reference: &NamedReference) -> Option<(&CallbackSlot, &CallbackInfo)> {
        let slot = self.state(reference.owner)?.callbacks.get(&reference.name)?;
        let info = self
            .compiled()
            .members(reference.owner)?
            .callbacks
            .get(&reference.name)?;
        Some((slot, info))
    }

    /// Locals visible to members of `owner`: repeater variables reach only
    /// elements inside the repeated template.
    fn locals_for(&self, owner: Owner, locals: &[(String, Value)]) -> Locals {
        match owner {
            Owner::Element(index)
                if self
                    .compiled()
                    .elements
                    .get(index)
                    .is_some_and(|e| e.template.is_some()) =>
            {
                locals.to_vec()
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn read_property(&self, reference: &NamedReference, locals: &[(String, Value)], depth: usize) -> Value {
        let Some((slot, info)) = self.property(reference) else {
            return Value::Void;
        };
        if !slot.has_binding.get() {
            return slot.value.borrow().clone();
        }
        let Some(binding) = info.binding.clone() else {
            return slot.value.borrow().clone();
        };
        if slot.evaluating.get() {
            log::error!("binding loop detected on property `{}`", reference.name);
            slot.looped.set(true);
            return info.ty.default_value();
        }
        if depth > MAX_DEPTH {
            log::error!("bindings nested too deeply while reading `{}`", reference.name);
            return info.ty.default_value();
        }

        slot.evaluating.set(true);
        let context = EvalContext::new(self, self.locals_for(reference.owner, locals), depth + 1);
        let value = context.eval(&binding);
        slot.evaluating.set(false);
        if slot.looped.replace(false) {
            return info.ty.default_value();
        }
        info.ty.convert(value).unwrap_or_else(|| info.ty.default_value())
    }

    /// Whether the slot holds a binding or an assigned non-default value.
    pub(crate) fn is_property_set(&self, reference: &NamedReference) -> bool {
        match self.property(reference) {
            Some((slot, info)) => slot.has_binding.get() || *slot.value.borrow() != info.ty.default_value(),
            None => false,
        }
    }

    /// Store `value`, replacing any binding. On a type mismatch nothing
    /// changes.
    pub(crate) fn write_property(&self, reference: &NamedReference, value: Value) -> Result<(), PropertyError> {
        let Some((slot, info)) = self.property(reference) else {
            return Err(PropertyError::NoSuchProperty(reference.name.clone()));
        };
        let found = value.value_type();
        let Some(converted) = info.ty.convert(value) else {
            log::warn!(
                "rejected assignment of a {} value to `{}` ({})",
                found,
                reference.name,
                info.ty
            );
            return Err(PropertyError::WrongType {
                name: reference.name.clone(),
                expected: info.ty.to_string(),
                found,
            });
        };
        slot.has_binding.set(false);
        *slot.value.borrow_mut() = converted;
        Ok(())
    }

    /// Invoke a callback: the host handler if one is set, else the default
    /// handler from source, else the return type's default. Results of
    /// callbacks declared without a return type are passed through as is.
    pub(crate) fn call_callback(
        &self,
        reference: &NamedReference,
        arguments: Vec<Value>,
        locals: &[(String, Value)],
        depth: usize,
    ) -> Value {
        let Some((slot, info)) = self.callback(reference) else {
            return Value::Void;
        };
        if depth > MAX_DEPTH {
            log::error!("callbacks nested too deeply while calling `{}`", reference.name);
            return info.return_type.default_value();
        }
        let arguments: Vec<Value> = arguments
            .into_iter()
            .zip(&info.parameters)
            .map(|(argument, ty)| {
                let fallback = ty.default_value();
                ty.convert(argument).unwrap_or(fallback)
            })
            .collect();

        let handler = slot.handler.borrow().clone();
        let result = match (handler, &info.handler) {
            (Some(handler), _) => handler.call(&arguments),
            (None, Some(default)) => {
                let mut scope = self.locals_for(reference.owner, locals);
                scope.extend(default.parameters.iter().cloned().zip(arguments));
                EvalContext::new(self, scope, depth).run_handler(&default.body)
            }
            (None, None) => return info.return_type.default_value(),
        };
        if info.return_type == Type::Void {
            return result;
        }
        match info.return_type.convert(result) {
            Some(value) => value,
            None => {
                log::warn!(
                    "handler of `{}` returned a value that is not a {}",
                    reference.name,
                    info.return_type
                );
                info.return_type.default_value()
            }
        }
    }

    fn set_handler(&self, reference: &NamedReference, handler: Rc<dyn CallbackHandler>) -> bool {
        match self.callback(reference) {
            Some((slot, _)) => {
                *slot.handler.borrow_mut() = Some(handler);
                true
            }
            None => false,
        }
    }

    pub(crate) fn repeater_cache(&self, element: usize, model: &ModelRc) -> Rc<ModelCache> {
        cached(&self.repeater_caches, element, model)
    }
}

impl Drop for InstanceInner {
    fn drop(&mut self) {
        leak_detector::record_instance_dropped();
        log::debug!("dropped instance of {}", self.definition.compiled().name);
    }
}

/// One cache per key, replaced when the key starts pointing at another model.
fn cached<K: Eq + Hash>(caches: &RefCell<HashMap<K, Rc<ModelCache>>>, key: K, model: &ModelRc) -> Rc<ModelCache> {
    let mut caches = caches.borrow_mut();
    if let Some(cache) = caches.get(&key) {
        if cache.model().ptr_eq(model) {
            return cache.clone();
        }
    }
    let cache = ModelCache::new(model);
    caches.insert(key, cache.clone());
    cache
}

/// Where a host call lands: the root element or an exported global.
enum Surface<'a> {
    Root,
    Global(&'a str),
}

/// A live instance of a [`ComponentDefinition`].
///
/// Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct ComponentInstance {
    inner: Rc<InstanceInner>,
}

impl ComponentInstance {
    pub(crate) fn new(definition: ComponentDefinition) -> Self {
        let compiled = definition.compiled();
        let elements = compiled
            .elements
            .iter()
            .map(|element| OwnerState::new(&element.members))
            .collect();
        let globals = compiled
            .globals
            .iter()
            .map(|global| OwnerState::new(&global.members))
            .collect();
        log::debug!("created instance of {}", compiled.name);
        leak_detector::record_instance_created();
        Self {
            inner: Rc::new(InstanceInner {
                definition,
                elements,
                globals,
                window: Window::new(),
                property_caches: RefCell::new(HashMap::new()),
                repeater_caches: RefCell::new(HashMap::new()),
                affinity: ThreadAffinity::current(),
            }),
        }
    }

    pub fn definition(&self) -> ComponentDefinition {
        self.inner.definition.clone()
    }

    pub fn as_weak(&self) -> WeakComponentInstance {
        WeakComponentInstance {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &ComponentInstance) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The error carries the name of a missing global.
    fn members(&self, surface: &Surface<'_>) -> Result<(Owner, &Members), String> {
        let compiled = self.inner.compiled();
        match surface {
            Surface::Root => Ok((Owner::Element(0), &compiled.root().members)),
            Surface::Global(name) => compiled
                .exported_global(name)
                .map(|(index, global)| (Owner::Global(index), &global.members))
                .ok_or_else(|| name.to_string()),
        }
    }

    fn public_property(&self, surface: &Surface<'_>, name: &str) -> Result<(NamedReference, &PropertyInfo), PropertyError> {
        let (owner, members) = self.members(surface).map_err(PropertyError::NoSuchGlobal)?;
        let name = normalize_name(name);
        match members.properties.get(&name) {
            Some(info) if !info.builtin && info.visibility.is_public() => {
                Ok((NamedReference::new(owner, name), info))
            }
            _ => Err(PropertyError::NoSuchProperty(name)),
        }
    }

    fn public_callback(&self, surface: &Surface<'_>, name: &str) -> Result<(NamedReference, &CallbackInfo), CallbackError> {
        let (owner, members) = self.members(surface).map_err(CallbackError::NoSuchGlobal)?;
        let name = normalize_name(name);
        match members.callbacks.get(&name) {
            Some(info) if !info.builtin => Ok((NamedReference::new(owner, name), info)),
            _ => Err(CallbackError::NoSuchCallback(name)),
        }
    }

    fn try_set_on(&self, surface: Surface<'_>, name: &str, value: Value) -> Result<(), PropertyError> {
        let (reference, info) = self.public_property(&surface, name)?;
        if !info.visibility.host_writable() {
            return Err(PropertyError::AccessDenied(reference.name));
        }
        self.inner.write_property(&reference, value)
    }

    fn try_get_on(&self, surface: Surface<'_>, name: &str) -> Result<Value, PropertyError> {
        let (reference, _) = self.public_property(&surface, name)?;
        Ok(self.inner.read_property(&reference, &[], 0))
    }

    fn try_invoke_on(&self, surface: Surface<'_>, name: &str, args: &[Value]) -> Result<Value, CallbackError> {
        let (reference, info) = self.public_callback(&surface, name)?;
        if args.len() != info.parameters.len() {
            return Err(CallbackError::ArgumentCount {
                name: reference.name,
                expected: info.parameters.len(),
                found: args.len(),
            });
        }
        let mut converted = Vec::with_capacity(args.len());
        for (index, (arg, ty)) in args.iter().zip(&info.parameters).enumerate() {
            match ty.convert(arg.clone()) {
                Some(value) => converted.push(value),
                None => {
                    return Err(CallbackError::ArgumentType {
                        name: reference.name,
                        index,
                        expected: ty.to_string(),
                        found: arg.value_type(),
                    });
                }
            }
        }
        Ok(self.inner.call_callback(&reference, converted, &[], 0))
    }

    fn try_set_callback_on(
        &self,
        surface: Surface<'_>,
        name: &str,
        handler: Rc<dyn CallbackHandler>,
    ) -> Result<(), CallbackError> {
        let (reference, _) = self.public_callback(&surface, name)?;
        self.inner.set_handler(&reference, handler);
        Ok(())
    }

    pub fn try_set_property(&self, name: &str, value: Value) -> Result<(), PropertyError> {
        self.inner.affinity.assert_current("ComponentInstance::set_property");
        self.try_set_on(Surface::Root, name, value)
    }

    pub fn try_get_property(&self, name: &str) -> Result<Value, PropertyError> {
        self.inner.affinity.assert_current("ComponentInstance::get_property");
        self.try_get_on(Surface::Root, name)
    }

    pub fn try_invoke_callback(&self, name: &str, args: &[Value]) -> Result<Value, CallbackError> {
        self.inner.affinity.assert_current("ComponentInstance::invoke_callback");
        self.try_invoke_on(Surface::Root, name, args)
    }

    pub fn try_set_callback(&self, name: &str, handler: impl CallbackHandler + 'static) -> Result<(), CallbackError> {
        self.inner.affinity.assert_current("ComponentInstance::set_callback");
        self.try_set_callback_on(Surface::Root, name, Rc::new(handler))
    }

    pub fn try_set_global_property(&self, global: &str, name: &str, value: Value) -> Result<(), PropertyError> {
        self.inner.affinity.assert_current("ComponentInstance::set_global_property");
        self.try_set_on(Surface::Global(global), name, value)
    }

    pub fn try_get_global_property(&self, global: &str, name: &str) -> Result<Value, PropertyError> {
        self.inner.affinity.assert_current("ComponentInstance::get_global_property");
        self.try_get_on(Surface::Global(global), name)
    }

    pub fn try_invoke_global_callback(&self, global: &str, name: &str, args: &[Value]) -> Result<Value, CallbackError> {
        self.inner.affinity.assert_current("ComponentInstance::invoke_global_callback");
        self.try_invoke_on(Surface::Global(global), name, args)
    }

    pub fn try_set_global_callback(
        &self,
        global: &str,
        name: &str,
        handler: impl CallbackHandler + 'static,
    ) -> Result<(), CallbackError> {
        self.inner.affinity.assert_current("ComponentInstance::set_global_callback");
        self.try_set_callback_on(Surface::Global(global), name, Rc::new(handler))
    }

    /// `false` when the property is unknown, not writable from the host, or
    /// the value has the wrong type. Nothing changes in that case.
    pub fn set_property(&self, name: &str, value: Value) -> bool {
        self.try_set_property(name, value).is_ok()
    }

    pub fn get_property(&self, name: &str) -> Option<Value> {
        self.try_get_property(name).ok()
    }

    /// `None` when the callback is unknown or the arguments do not match its
    /// declaration. Otherwise the handler's result, converted to the declared
    /// return type; callbacks without one return whatever the handler did.
    pub fn invoke_callback(&self, name: &str, args: &[Value]) -> Option<Value> {
        self.try_invoke_callback(name, args).ok()
    }

    /// Replace the handler of `name`. Component logic calling the callback
    /// runs it too.
    pub fn set_callback(&self, name: &str, handler: impl CallbackHandler + 'static) -> bool {
        self.try_set_callback(name, handler).is_ok()
    }

    pub fn set_global_property(&self, global: &str, name: &str, value: Value) -> bool {
        self.try_set_global_property(global, name, value).is_ok()
    }

    pub fn get_global_property(&self, global: &str, name: &str) -> Option<Value> {
        self.try_get_global_property(global, name).ok()
    }

    pub fn invoke_global_callback(&self, global: &str, name: &str, args: &[Value]) -> Option<Value> {
        self.try_invoke_global_callback(global, name, args).ok()
    }

    pub fn set_global_callback(&self, global: &str, name: &str, handler: impl CallbackHandler + 'static) -> bool {
        self.try_set_global_callback(global, name, handler).is_ok()
    }

    /// Rows of a model-typed public property, read through a cache that
    /// follows the model's notifications.
    pub fn rows(&self, name: &str) -> Option<Vec<Value>> {
        self.inner.affinity.assert_current("ComponentInstance::rows");
        let (reference, _) = self.public_property(&Surface::Root, name).ok()?;
        let value = self.inner.read_property(&reference, &[], 0);
        let model = value.as_model()?;
        let cache = cached(&self.inner.property_caches, reference.name, model);
        Some(cache.rows())
    }

    pub fn window(&self) -> &Window {
        self.inner.affinity.assert_current("ComponentInstance::window");
        &self.inner.window
    }

    pub fn show(&self) {
        self.inner.affinity.assert_current("ComponentInstance::show");
        self.inner.window.show();
    }

    pub fn hide(&self) {
        self.inner.affinity.assert_current("ComponentInstance::hide");
        self.inner.window.hide();
    }

    /// Show the window, run the event loop until it quits, hide the window.
    ///
    /// Fails with [`EventLoopError::AlreadyRunning`] from inside a running
    /// loop, leaving the window as it was.
    pub fn run(&self) -> Result<(), EventLoopError> {
        if event_loop::is_running() {
            return Err(EventLoopError::AlreadyRunning);
        }
        self.show();
        let result = event_loop::run_event_loop();
        self.hide();
        result
    }

    /// Element tree with every binding evaluated and repeaters expanded.
    pub fn render_scene(&self) -> SceneNode {
        self.inner.affinity.assert_current("ComponentInstance::render_scene");
        scene::render(&self.inner)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("component", &self.inner.compiled().name)
            .field("visible", &self.inner.window.is_visible())
            .finish()
    }
}

/// Non-owning handle, for handlers that need to reach their own instance.
#[derive(Clone)]
pub struct WeakComponentInstance {
    inner: Weak<InstanceInner>,
}

impl WeakComponentInstance {
    pub fn upgrade(&self) -> Option<ComponentInstance> {
        self.inner.upgrade().map(|inner| ComponentInstance { inner })
    }
}

impl fmt::Debug for WeakComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakComponentInstance")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
