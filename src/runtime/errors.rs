use crate::runtime::value::ValueType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("no public property named `{0}`")]
    NoSuchProperty(String),
    #[error("no exported global named `{0}`")]
    NoSuchGlobal(String),
    #[error("property `{0}` is an output property and cannot be set")]
    AccessDenied(String),
    #[error("property `{name}` of type {expected} cannot hold a {found} value")]
    WrongType {
        name: String,
        expected: String,
        found: ValueType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("no callback named `{0}`")]
    NoSuchCallback(String),
    #[error("no exported global named `{0}`")]
    NoSuchGlobal(String),
    #[error("callback `{name}` takes {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("argument {index} of callback `{name}` must be {expected}, got a {found} value")]
    ArgumentType {
        name: String,
        index: usize,
        expected: String,
        found: ValueType,
    },
}
