//! Source of the builtin `std-widgets.vel` module, themed by style.

pub(crate) const MODULE_NAME: &str = "std-widgets.vel";

pub const KNOWN_STYLES: &[&str] = &["fluent", "material", "cupertino", "native"];

pub const DEFAULT_STYLE: &str = "fluent";

struct Palette {
    accent: &'static str,
    on_accent: &'static str,
    surface: &'static str,
    text: &'static str,
    radius: &'static str,
}

fn palette(style: &str) -> Option<Palette> {
    let palette = match style {
        "fluent" => Palette {
            accent: "#0078d4",
            on_accent: "#ffffff",
            surface: "#fafafa",
            text: "#1a1a1a",
            radius: "4px",
        },
        "material" => Palette {
            accent: "#6750a4",
            on_accent: "#ffffff",
            surface: "#fffbfe",
            text: "#1c1b1f",
            radius: "20px",
        },
        "cupertino" => Palette {
            accent: "#007aff",
            on_accent: "#ffffff",
            surface: "#f2f2f7",
            text: "#000000",
            radius: "6px",
        },
        "native" => Palette {
            accent: "#dddddd",
            on_accent: "#000000",
            surface: "#ffffff",
            text: "#000000",
            radius: "2px",
        },
        _ => return None,
    };
    Some(palette)
}

pub fn is_known_style(style: &str) -> bool {
    KNOWN_STYLES.contains(&style)
}

/// `None` for an unknown style.
pub(crate) fn source(style: &str) -> Option<String> {
    let p = palette(style)?;
    Some(format!(
        r#"export component Button inherits Rectangle {{
    in property <string> text;
    in property <bool> enabled: true;
    callback clicked;
    background: {accent};
    border-radius: {radius};
    touch := TouchArea {{
        enabled: root.enabled;
        clicked => {{ root.clicked(); }}
    }}
    label := Text {{
        text: root.text;
        color: {on_accent};
    }}
}}

export component CheckBox inherits Rectangle {{
    in property <string> text;
    in-out property <bool> checked;
    callback toggled;
    TouchArea {{
        clicked => {{
            root.checked = !root.checked;
            root.toggled();
        }}
    }}
    Text {{
        text: root.text;
        color: {text};
    }}
}}

export component LineEdit inherits Rectangle {{
    in-out property <string> text;
    in property <string> placeholder-text;
    callback accepted(string);
    callback edited(string);
    background: {surface};
    border-color: {accent};
    border-width: 1px;
    border-radius: {radius};
    Text {{
        text: root.text == "" ? root.placeholder-text : root.text;
        color: {text};
    }}
}}

export component ListView inherits Rectangle {{
    background: {surface};
}}
"#,
        accent = p.accent,
        on_accent = p.on_accent,
        surface = p.surface,
        text = p.text,
        radius = p.radius,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_document;

    #[test]
    fn every_style_parses_cleanly() {
        for style in KNOWN_STYLES {
            let source = source(style).unwrap();
            let (document, errors) = parse_document(&source, Some(MODULE_NAME));
            assert!(errors.is_empty(), "{}: {:?}", style, errors);
            assert_eq!(document.items.len(), 4);
        }
    }

    #[test]
    fn unknown_style_has_no_source() {
        assert!(source("brutalist").is_none());
        assert!(!is_known_style("brutalist"));
    }
}
