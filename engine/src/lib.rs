pub mod arithmetic;
mod assembler;
mod codegen;
pub mod context;
pub mod emitter;
pub mod engine;
pub mod error;
mod executor;
pub mod loader;
pub mod runtime_value;
pub mod settings;
pub mod source;
pub mod template;
pub mod unit;

pub use context::Context;
pub use engine::Engine;
pub use error::{EngineError, LoadError, RenderError};
pub use runtime_value::RuntimeValue;
pub use settings::Settings;
pub use source::{FileLoader, InMemoryLoader, SourceLoader};
pub use template::Template;
