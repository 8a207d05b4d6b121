use std::{fmt, path::Path, rc::Rc};

use serde::Serialize;

use crate::compiler::{
    langtype::Type,
    object_tree::{CompiledComponent, Members},
};
use crate::runtime::{instance::ComponentInstance, thread::ThreadAffinity, value::ValueType};

/// Public property of a component or global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub value_type: ValueType,
}

/// A compiled component: introspection and a factory for instances.
///
/// Cloning is cheap and shares the compiled tree. A definition stays valid
/// after the compiler that built it is dropped.
#[derive(Clone)]
pub struct ComponentDefinition {
    inner: Rc<CompiledComponent>,
    affinity: ThreadAffinity,
}

impl ComponentDefinition {
    pub(crate) fn new(inner: Rc<CompiledComponent>) -> Self {
        Self {
            inner,
            affinity: ThreadAffinity::current(),
        }
    }

    pub(crate) fn compiled(&self) -> &CompiledComponent {
        &self.inner
    }

    pub fn name(&self) -> &str {
        self.affinity.assert_current("ComponentDefinition::name");
        &self.inner.name
    }

    /// Public properties in declaration order.
    pub fn properties(&self) -> Vec<PropertyDescriptor> {
        self.affinity.assert_current("ComponentDefinition::properties");
        descriptors(&self.inner.root().members)
    }

    pub fn callbacks(&self) -> Vec<String> {
        self.affinity.assert_current("ComponentDefinition::callbacks");
        callback_names(&self.inner.root().members)
    }

    /// Names of the exported globals.
    pub fn globals(&self) -> Vec<String> {
        self.affinity.assert_current("ComponentDefinition::globals");
        self.inner.exported_globals.keys().cloned().collect()
    }

    /// `None` when no exported global is called `global`.
    pub fn global_properties(&self, global: &str) -> Option<Vec<PropertyDescriptor>> {
        self.affinity.assert_current("ComponentDefinition::global_properties");
        let (_, info) = self.inner.exported_global(global)?;
        Some(descriptors(&info.members))
    }

    pub fn global_callbacks(&self, global: &str) -> Option<Vec<String>> {
        self.affinity.assert_current("ComponentDefinition::global_callbacks");
        let (_, info) = self.inner.exported_global(global)?;
        Some(callback_names(&info.members))
    }

    /// Declared type of a public property.
    pub fn property_type(&self, name: &str) -> Option<Type> {
        self.affinity.assert_current("ComponentDefinition::property_type");
        let name = crate::syntax::normalize_name(name);
        self.inner
            .root()
            .members
            .public_properties()
            .find(|(n, _)| **n == name)
            .map(|(_, info)| info.ty.clone())
    }

    pub fn global_property_type(&self, global: &str, name: &str) -> Option<Type> {
        self.affinity.assert_current("ComponentDefinition::global_property_type");
        let name = crate::syntax::normalize_name(name);
        let (_, info) = self.inner.exported_global(global)?;
        info.members
            .public_properties()
            .find(|(n, _)| **n == name)
            .map(|(_, info)| info.ty.clone())
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.affinity.assert_current("ComponentDefinition::source_path");
        self.inner.source_path.as_deref()
    }

    pub fn style(&self) -> &str {
        self.affinity.assert_current("ComponentDefinition::style");
        &self.inner.style
    }

    pub fn create(&self) -> ComponentInstance {
        self.affinity.assert_current("ComponentDefinition::create");
        ComponentInstance::new(self.clone())
    }

    pub fn ptr_eq(&self, other: &ComponentDefinition) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn summary(&self) -> DefinitionSummary {
        self.affinity.assert_current("ComponentDefinition::summary");
        let inner = &self.inner;
        DefinitionSummary {
            name: inner.name.clone(),
            style: inner.style.clone(),
            source_path: inner.source_path.as_ref().map(|p| p.display().to_string()),
            properties: property_summaries(&inner.root().members),
            callbacks: callback_summaries(&inner.root().members),
            globals: inner
                .exported_globals
                .iter()
                .filter_map(|(name, &index)| {
                    let global = inner.globals.get(index)?;
                    Some(GlobalSummary {
                        name: name.clone(),
                        properties: property_summaries(&global.members),
                        callbacks: callback_summaries(&global.members),
                    })
                })
                .collect(),
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.inner.name)
            .field("style", &self.inner.style)
            .finish()
    }
}

fn descriptors(members: &Members) -> Vec<PropertyDescriptor> {
    members
        .public_properties()
        .map(|(name, info)| PropertyDescriptor {
            name: name.clone(),
            value_type: info.ty.value_type(),
        })
        .collect()
}

fn callback_names(members: &Members) -> Vec<String> {
    members.public_callbacks().map(|(name, _)| name.clone()).collect()
}

/// Serializable description of a definition's public surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionSummary {
    pub name: String,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    pub properties: Vec<PropertySummary>,
    pub callbacks: Vec<CallbackSummary>,
    pub globals: Vec<GlobalSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySummary {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
    pub value_type: ValueType,
    pub access: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackSummary {
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalSummary {
    pub name: String,
    pub properties: Vec<PropertySummary>,
    pub callbacks: Vec<CallbackSummary>,
}

fn property_summaries(members: &Members) -> Vec<PropertySummary> {
    members
        .public_properties()
        .map(|(name, info)| PropertySummary {
            name: name.clone(),
            declared_type: info.ty.to_string(),
            value_type: info.ty.value_type(),
            access: info.visibility.as_str(),
        })
        .collect()
}

fn callback_summaries(members: &Members) -> Vec<CallbackSummary> {
    members
        .public_callbacks()
        .map(|(name, info)| CallbackSummary {
            name: name.clone(),
            parameters: info.parameters.iter().map(|ty| ty.to_string()).collect(),
            return_type: info.return_type.to_string(),
        })
        .collect()
}
