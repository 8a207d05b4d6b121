use std::fmt;

use indexmap::IndexMap;

use crate::compiler::expression_tree::{NamedReference, Owner};
use crate::runtime::{
    eval::{EvalContext, Locals},
    instance::InstanceInner,
    value::Value,
};

/// Snapshot of one element with its bindings evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Builtin element at the bottom of the inheritance chain.
    pub element_type: String,
    /// Type as written in source.
    pub type_name: String,
    pub id: Option<String>,
    /// Declared properties, plus builtin ones that were bound or assigned.
    pub properties: IndexMap<String, Value>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Number of nodes in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// First node in depth-first order with the given id.
    pub fn find(&self, id: &str) -> Option<&SceneNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{}{}", indent, self.type_name)?;
        if self.type_name != self.element_type {
            write!(f, " ({})", self.element_type)?;
        }
        if let Some(id) = &self.id {
            write!(f, " #{}", id)?;
        }
        writeln!(f)?;
        for (name, value) in &self.properties {
            writeln!(f, "{}  .{} = {}", indent, name, value)?;
        }
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Upper bound on the rows a numeric repeater (`for i in n`) expands to.
pub const MAX_NUMERIC_REPEATER_ROWS: usize = 100_000;

fn numeric_rows(count: f64) -> Vec<Value> {
    if !count.is_finite() {
        log::warn!("repeater count {} is not finite; rendering no rows", count);
        return Vec::new();
    }
    let mut rows = count.max(0.0) as usize;
    if rows > MAX_NUMERIC_REPEATER_ROWS {
        log::warn!(
            "repeater count {} exceeds {}; truncating",
            rows,
            MAX_NUMERIC_REPEATER_ROWS
        );
        rows = MAX_NUMERIC_REPEATER_ROWS;
    }
    (0..rows).map(Value::from).collect()
}

pub(crate) fn render(instance: &InstanceInner) -> SceneNode {
    render_element(instance, 0, &Vec::new())
}

fn render_element(instance: &InstanceInner, index: usize, locals: &Locals) -> SceneNode {
    let element = &instance.compiled().elements[index];
    let mut properties = IndexMap::new();
    for (name, info) in &element.members.properties {
        let reference = NamedReference::new(Owner::Element(index), name.as_str());
        if info.builtin && !instance.is_property_set(&reference) {
            continue;
        }
        properties.insert(name.clone(), instance.read_property(&reference, locals, 0));
    }

    let mut children = Vec::new();
    for &child in &element.children {
        let Some(repeater) = &instance.compiled().elements[child].repeater else {
            children.push(render_element(instance, child, locals));
            continue;
        };
        let model = EvalContext::new(instance, locals.clone(), 0).eval(&repeater.model);
        let rows = match &model {
            Value::Model(model) => instance.repeater_cache(child, model).rows(),
            Value::Number(count) => numeric_rows(*count),
            other => {
                log::warn!("repeater model evaluated to a {} value", other.type_name());
                Vec::new()
            }
        };
        for (row, data) in rows.into_iter().enumerate() {
            let mut scope = locals.clone();
            scope.push((repeater.item.clone(), data));
            if let Some(index_name) = &repeater.index {
                scope.push((index_name.clone(), Value::from(row)));
            }
            children.push(render_element(instance, child, &scope));
        }
    }

    SceneNode {
        element_type: element.base_type.clone(),
        type_name: element.type_name.clone(),
        id: element.id.clone(),
        properties,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(type_name: &str, id: Option<&str>) -> SceneNode {
        SceneNode {
            element_type: "Rectangle".to_string(),
            type_name: type_name.to_string(),
            id: id.map(str::to_string),
            properties: IndexMap::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn display_indents_children() {
        let mut root = leaf("Card", Some("root"));
        root.properties.insert("title".to_string(), Value::from("Hi"));
        root.children.push(leaf("Rectangle", None));

        insta::assert_snapshot!(root.to_string(), @r#"
        Card (Rectangle) #root
          .title = "Hi"
          Rectangle
        "#);
        assert_eq!(root.node_count(), 2);
        assert!(root.find("root").is_some());
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn numeric_rows_are_bounded() {
        assert!(numeric_rows(f64::INFINITY).is_empty());
        assert!(numeric_rows(f64::NEG_INFINITY).is_empty());
        assert!(numeric_rows(f64::NAN).is_empty());
        assert_eq!(numeric_rows(2.7), vec![Value::from(0), Value::from(1)]);
        assert_eq!(numeric_rows(1e12).len(), MAX_NUMERIC_REPEATER_ROWS);
    }
}
