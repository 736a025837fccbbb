//! # Barista Isolation
//!
//! `barista_isolation` provides the sandbox used by the `barista` binary.
//! Spec files are declarative (TOML or JSON); the bodies of their tests and
//! hooks are shell commands, each run in its own child process.
//!
//! Key concepts:
//!
//! 1. **Script module**: A parsed spec file or required fragment.
//!
//! 2. **Module loader**: Resolves `require` specifiers and caches modules,
//!    one loader per spec.
//!
//! 3. **Script host**: The [`barista_engine::Sandbox`] turning script items
//!    into declarations.
//!
//! 4. **Command**: An isolated child process with a cleared environment.

pub mod host;
pub mod script;

pub use host::command::{run_command, CommandEnv, CommandOutput};
pub use host::ScriptHost;
pub use script::{parse_module, CommandExpectation, ModuleLoader, ScriptItem, ScriptModule};
