//! Spec-file schema and module loading.

pub mod loader;
pub mod model;

pub use loader::{parse_module, ModuleLoader};
pub use model::{CommandExpectation, ScriptItem, ScriptModule};
