//! Barista Engine
//!
//! The scheduler of the Barista test runner. Spec code declares suites,
//! tests and hooks through a [`Scope`]; declarations are queued on ordered
//! chains and executed later, serially and depth-first within a spec, while
//! several specs progress concurrently. Results are collected into a
//! [`ResultTree`] with rollup counters.
//!
//! # Features
//!
//! - Deferred registration: `describe`/`it` bodies run when reached, not when declared
//! - Hooks: `before`/`after` once per container, `before_each`/`after_each` per test
//! - Deadlines on every hook, test and generator; zero disables the deadline
//! - Retry-capable tests with a non-retryable error category set
//! - Data-driven tests and suites expanded from literal or produced values
//! - Fast-fail skip propagation
//! - A lifecycle event bus whose emissions are awaited
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use barista_core::RunConfig;
//! use barista_engine::{expect, InlineSandbox, SpecScheduler};
//!
//! let sandbox = InlineSandbox::new().with_spec("math.test", |api| {
//!     api.describe("math", |s| async move {
//!         s.it("adds", || async { expect(1 + 1).to_equal(2) });
//!         Ok(())
//!     });
//!     Ok(())
//! });
//!
//! tokio::runtime::Runtime::new().unwrap().block_on(async {
//!     let scheduler = SpecScheduler::new(RunConfig::default(), Arc::new(sandbox)).unwrap();
//!     let summary = scheduler.run(vec!["math.test".into()]).await;
//!     assert_eq!(summary.exit_code(), 0);
//! });
//! ```

/// Result tree model
pub mod model;

/// Chain engine, envelope and scheduler
pub mod engine;

/// Skip policy, generators and the event bus
pub mod patterns;

#[cfg(test)]
mod integration_tests;

pub use engine::{
    expect, Declared, Expectation, InlineSandbox, RetryPolicy, RunSummary, Sandbox, Scope,
    SpecScheduler,
};
pub use model::{Counts, NodeKind, NodeState, ReportNode, ResultTree};
pub use patterns::{Condition, EventBus, EventPayload, LifecycleEvent, Values};
