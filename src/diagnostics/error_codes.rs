//! Static error code table.
//!
//! `E0xx` are syntax errors, `E1xx` are semantic errors found while lowering
//! a document, `W0xx` are warnings.

use super::{ErrorCode, Severity};

pub const UNEXPECTED_TOKEN: ErrorCode = ErrorCode {
    code: "E001",
    title: "UNEXPECTED TOKEN",
    severity: Severity::Error,
    message: "Expected {}, found `{}`.",
    hint: None,
};

pub const UNTERMINATED_STRING: ErrorCode = ErrorCode {
    code: "E002",
    title: "UNTERMINATED STRING",
    severity: Severity::Error,
    message: "This string literal is never closed.",
    hint: Some("Add a closing `\"` before the end of the line."),
};

pub const INVALID_CHARACTER: ErrorCode = ErrorCode {
    code: "E003",
    title: "INVALID CHARACTER",
    severity: Severity::Error,
    message: "Unexpected character `{}`.",
    hint: None,
};

pub const INVALID_NUMBER: ErrorCode = ErrorCode {
    code: "E004",
    title: "INVALID NUMBER",
    severity: Severity::Error,
    message: "Invalid number literal `{}`.",
    hint: Some("Units are written without a space: `10px`, `250ms`, `45deg`, `50%`."),
};

pub const INVALID_COLOR: ErrorCode = ErrorCode {
    code: "E005",
    title: "INVALID COLOR",
    severity: Severity::Error,
    message: "Invalid color literal `{}`.",
    hint: Some("Colors are written as #rgb, #rgba, #rrggbb or #rrggbbaa."),
};

pub const UNTERMINATED_COMMENT: ErrorCode = ErrorCode {
    code: "E006",
    title: "UNTERMINATED COMMENT",
    severity: Severity::Error,
    message: "This block comment is never closed.",
    hint: Some("Add `*/` to close it."),
};

pub const EXPECTED_EXPRESSION: ErrorCode = ErrorCode {
    code: "E007",
    title: "EXPECTED EXPRESSION",
    severity: Severity::Error,
    message: "Expected an expression, found `{}`.",
    hint: None,
};

pub const UNSUPPORTED_SYNTAX: ErrorCode = ErrorCode {
    code: "E008",
    title: "UNSUPPORTED SYNTAX",
    severity: Severity::Error,
    message: "{} is not supported.",
    hint: None,
};

pub const DUPLICATE_DECLARATION: ErrorCode = ErrorCode {
    code: "E100",
    title: "DUPLICATE DECLARATION",
    severity: Severity::Error,
    message: "`{}` is already declared in this scope.",
    hint: Some("Use a different name or remove the previous declaration."),
};

pub const UNKNOWN_TYPE: ErrorCode = ErrorCode {
    code: "E101",
    title: "UNKNOWN TYPE",
    severity: Severity::Error,
    message: "Unknown type `{}`.",
    hint: Some(
        "Builtin types are int, float, string, bool, color, brush, image, length, duration, angle, percent and void. Structs must be declared or imported before use.",
    ),
};

pub const UNKNOWN_ELEMENT: ErrorCode = ErrorCode {
    code: "E102",
    title: "UNKNOWN ELEMENT",
    severity: Severity::Error,
    message: "Unknown element type `{}`.",
    hint: Some("Declare the component earlier in the file or import it."),
};

pub const UNKNOWN_NAME: ErrorCode = ErrorCode {
    code: "E103",
    title: "UNKNOWN NAME",
    severity: Severity::Error,
    message: "I can't find a property, callback, element or global named `{}`.",
    hint: None,
};

pub const NOT_ASSIGNABLE: ErrorCode = ErrorCode {
    code: "E104",
    title: "NOT ASSIGNABLE",
    severity: Severity::Error,
    message: "`{}` is not a property and cannot be assigned.",
    hint: None,
};

pub const TYPE_MISMATCH: ErrorCode = ErrorCode {
    code: "E105",
    title: "TYPE MISMATCH",
    severity: Severity::Error,
    message: "Cannot convert {} to {}.",
    hint: None,
};

pub const HANDLER_ARITY: ErrorCode = ErrorCode {
    code: "E106",
    title: "HANDLER ARITY",
    severity: Severity::Error,
    message: "Callback `{}` has {} parameter(s), but the handler names {}.",
    hint: None,
};

pub const NOT_A_CALLBACK: ErrorCode = ErrorCode {
    code: "E107",
    title: "NOT A CALLBACK",
    severity: Severity::Error,
    message: "`{}` is not a callback.",
    hint: Some("Handlers `name(args) => { ... }` can only be set on declared callbacks."),
};

pub const ARGUMENT_COUNT: ErrorCode = ErrorCode {
    code: "E108",
    title: "ARGUMENT COUNT",
    severity: Severity::Error,
    message: "`{}` expects {} argument(s), got {}.",
    hint: None,
};

pub const UNKNOWN_MEMBER: ErrorCode = ErrorCode {
    code: "E109",
    title: "UNKNOWN MEMBER",
    severity: Severity::Error,
    message: "`{}` has no member named `{}`.",
    hint: None,
};

pub const NOT_CALLABLE: ErrorCode = ErrorCode {
    code: "E110",
    title: "NOT CALLABLE",
    severity: Severity::Error,
    message: "`{}` cannot be called.",
    hint: Some("Only callbacks and builtin functions can be called."),
};

pub const RECURSIVE_TYPE: ErrorCode = ErrorCode {
    code: "E111",
    title: "RECURSIVE TYPE",
    severity: Severity::Error,
    message: "`{}` cannot contain itself.",
    hint: None,
};

pub const INVALID_OPERANDS: ErrorCode = ErrorCode {
    code: "E112",
    title: "INVALID OPERANDS",
    severity: Severity::Error,
    message: "Operator `{}` cannot be applied to {} and {}.",
    hint: None,
};

pub const IMPORT_NOT_FOUND: ErrorCode = ErrorCode {
    code: "E120",
    title: "IMPORT NOT FOUND",
    severity: Severity::Error,
    message: "Cannot find imported file `{}`.",
    hint: Some("Imports are resolved relative to the importing file, then in each include path."),
};

pub const IMPORT_CYCLE: ErrorCode = ErrorCode {
    code: "E121",
    title: "IMPORT CYCLE",
    severity: Severity::Error,
    message: "Import cycle detected: {}.",
    hint: None,
};

pub const UNKNOWN_IMPORT: ErrorCode = ErrorCode {
    code: "E122",
    title: "UNKNOWN IMPORT",
    severity: Severity::Error,
    message: "`{}` is not exported by `{}`.",
    hint: None,
};

pub const FILE_READ: ErrorCode = ErrorCode {
    code: "E123",
    title: "FILE READ",
    severity: Severity::Error,
    message: "Could not read `{}`: {}.",
    hint: None,
};

pub const IMAGE_LOAD: ErrorCode = ErrorCode {
    code: "E124",
    title: "IMAGE LOAD",
    severity: Severity::Error,
    message: "Cannot load image `{}`: {}.",
    hint: Some("Image paths are resolved relative to the file that mentions them."),
};

pub const UNKNOWN_STYLE: ErrorCode = ErrorCode {
    code: "E130",
    title: "UNKNOWN STYLE",
    severity: Severity::Error,
    message: "Unknown style `{}`.",
    hint: Some("Known styles are fluent, material, cupertino and native."),
};

pub const NO_COMPONENT: ErrorCode = ErrorCode {
    code: "E131",
    title: "NO COMPONENT",
    severity: Severity::Error,
    message: "The document does not declare any component.",
    hint: Some("Add `export component Name { }`."),
};

pub const NO_EXPORTED_COMPONENT: ErrorCode = ErrorCode {
    code: "W001",
    title: "NO EXPORTED COMPONENT",
    severity: Severity::Warning,
    message: "No component is exported; using `{}`.",
    hint: Some("Mark the main component with `export`."),
};

pub const ERROR_CODES: &[&ErrorCode] = &[
    &UNEXPECTED_TOKEN,
    &UNTERMINATED_STRING,
    &INVALID_CHARACTER,
    &INVALID_NUMBER,
    &INVALID_COLOR,
    &UNTERMINATED_COMMENT,
    &EXPECTED_EXPRESSION,
    &UNSUPPORTED_SYNTAX,
    &DUPLICATE_DECLARATION,
    &UNKNOWN_TYPE,
    &UNKNOWN_ELEMENT,
    &UNKNOWN_NAME,
    &NOT_ASSIGNABLE,
    &TYPE_MISMATCH,
    &HANDLER_ARITY,
    &NOT_A_CALLBACK,
    &ARGUMENT_COUNT,
    &UNKNOWN_MEMBER,
    &NOT_CALLABLE,
    &RECURSIVE_TYPE,
    &INVALID_OPERANDS,
    &IMPORT_NOT_FOUND,
    &IMPORT_CYCLE,
    &UNKNOWN_IMPORT,
    &FILE_READ,
    &IMAGE_LOAD,
    &UNKNOWN_STYLE,
    &NO_COMPONENT,
    &NO_EXPORTED_COMPONENT,
];

pub fn lookup_error_code(code: &str) -> Option<&'static ErrorCode> {
    ERROR_CODES.iter().copied().find(|entry| entry.code == code)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut seen = HashSet::new();
        for entry in ERROR_CODES {
            assert!(seen.insert(entry.code), "duplicate code {}", entry.code);
        }
    }

    #[test]
    fn warning_codes_have_warning_severity() {
        for entry in ERROR_CODES {
            let is_warning = entry.code.starts_with('W');
            assert_eq!(is_warning, entry.severity == Severity::Warning, "{}", entry.code);
        }
    }

    #[test]
    fn lookup_finds_registered_code() {
        assert_eq!(lookup_error_code("E101").map(|e| e.title), Some("UNKNOWN TYPE"));
        assert!(lookup_error_code("E999").is_none());
    }
}
