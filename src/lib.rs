pub mod compiler;
pub mod diagnostics;
pub mod runtime;
pub mod syntax;

pub use compiler::{CompilationResult, ComponentCompiler, CompilerConfiguration};
pub use runtime::{
    brush::{Brush, Color},
    callback::CallbackHandler,
    definition::{ComponentDefinition, PropertyDescriptor},
    errors::{CallbackError, PropertyError},
    image::Image,
    instance::{ComponentInstance, WeakComponentInstance},
    model::{Model, ModelAdapter, ModelPeer, ModelRc, VecModel},
    structs::Struct,
    value::{Value, ValueType},
};
