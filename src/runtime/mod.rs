pub mod brush;
pub mod callback;
pub mod definition;
pub mod errors;
pub(crate) mod eval;
pub mod event_loop;
pub mod image;
pub mod instance;
pub mod json;
pub mod leak_detector;
pub mod model;
pub mod scene;
pub mod structs;
pub mod thread;
pub mod value;
pub mod window;
