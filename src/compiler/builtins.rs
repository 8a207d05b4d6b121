use crate::compiler::langtype::Type;

/// Native element provided by the runtime. Every element bottoms out in one.
pub(crate) struct BuiltinElement {
    pub name: &'static str,
    pub properties: Vec<(&'static str, Type)>,
    pub callbacks: &'static [&'static str],
}

/// Base of components declared without `inherits`.
pub(crate) const EMPTY: &str = "Empty";

const GEOMETRY: [&str; 4] = ["x", "y", "width", "height"];

pub(crate) fn lookup(name: &str) -> Option<BuiltinElement> {
    let (properties, callbacks): (Vec<(&'static str, Type)>, &'static [&'static str]) = match name {
        EMPTY => (vec![], &[]),
        "Rectangle" => (
            vec![
                ("background", Type::Brush),
                ("border-color", Type::Brush),
                ("border-width", Type::Length),
                ("border-radius", Type::Length),
            ],
            &[],
        ),
        "Text" => (
            vec![
                ("text", Type::String),
                ("color", Type::Brush),
                ("font-size", Type::Length),
            ],
            &[],
        ),
        "Image" => (
            vec![("source", Type::Image), ("colorize", Type::Brush)],
            &[],
        ),
        "TouchArea" => (
            vec![("enabled", Type::Bool), ("pressed", Type::Bool)],
            &["clicked"],
        ),
        "VerticalLayout" | "HorizontalLayout" => (
            vec![("spacing", Type::Length), ("padding", Type::Length)],
            &[],
        ),
        "Window" => (
            vec![("title", Type::String), ("background", Type::Brush)],
            &[],
        ),
        _ => return None,
    };

    let static_name = BUILTIN_NAMES.iter().copied().find(|n| *n == name)?;
    let mut all: Vec<(&'static str, Type)> = GEOMETRY.iter().map(|n| (*n, Type::Length)).collect();
    all.extend(properties);
    Some(BuiltinElement {
        name: static_name,
        properties: all,
        callbacks,
    })
}

pub(crate) const BUILTIN_NAMES: &[&str] = &[
    EMPTY,
    "Rectangle",
    "Text",
    "Image",
    "TouchArea",
    "VerticalLayout",
    "HorizontalLayout",
    "Window",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_builtin_resolves() {
        for name in BUILTIN_NAMES {
            let element = lookup(name).unwrap();
            assert_eq!(element.name, *name);
            assert!(element.properties.iter().any(|(p, _)| *p == "width"));
        }
        assert!(lookup("Button").is_none());
    }

    #[test]
    fn touch_area_has_clicked() {
        assert_eq!(lookup("TouchArea").unwrap().callbacks, &["clicked"]);
    }
}
