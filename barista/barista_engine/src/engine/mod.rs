//! Chain composition, the timeout/retry envelope, per-spec scheduling and
//! the top-level spec scheduler.

pub mod chain;
pub mod envelope;
pub mod expect;
pub mod runtime;
pub mod sandbox;
pub mod scheduler;
pub mod scope;

pub use chain::{Chain, ChainKind};
pub use envelope::{retry, within, Attempted, RetryPolicy};
pub use expect::{expect, Expectation};
pub use runtime::SpecRuntime;
pub use sandbox::{InlineSandbox, Sandbox, SpecFn};
pub use scheduler::{RunSummary, SpecScheduler};
pub use scope::{Declared, EachSuiteFn, EachTestFn, Scope, SuiteFn, TestFn};
