//! The registration context handed to spec code.
//!
//! A `Scope` is bound to one container node and to the chain its
//! declarations are queued on. Suite bodies receive a fresh `Scope` for the
//! suite being entered, so nested declarations attach to the right parent
//! without any shared cursor.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use barista_core::{NodeId, TestResult};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::chain::Chain;
use super::runtime::{Expansion, HookDef, SpecRuntime, TestBody};
use crate::model::{GeneratorKind, HookKind, ResultTree};
use crate::patterns::generator::Values;
use crate::patterns::skip::Condition;

/// Body of a test or hook; called once per attempt
pub type TestFn = Arc<dyn Fn() -> BoxFuture<'static, TestResult> + Send + Sync>;

/// Body of a suite; registers the suite's children
pub type SuiteFn = Box<dyn FnOnce(Scope) -> BoxFuture<'static, TestResult> + Send>;

/// Body of a `mit` instance: the value and its zero-based index
pub type EachTestFn = Arc<dyn Fn(Value, usize) -> BoxFuture<'static, TestResult> + Send + Sync>;

/// Body of a `mdescribe` instance
pub type EachSuiteFn =
    Arc<dyn Fn(Scope, Value, usize) -> BoxFuture<'static, TestResult> + Send + Sync>;

fn test_fn<F, Fut>(f: F) -> TestFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TestResult> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

fn suite_fn<F, Fut>(f: F) -> SuiteFn
where
    F: FnOnce(Scope) -> Fut + Send + 'static,
    Fut: Future<Output = TestResult> + Send + 'static,
{
    Box::new(move |scope: Scope| f(scope).boxed())
}

/// Registration context of one container.
#[derive(Clone)]
pub struct Scope {
    runtime: Arc<SpecRuntime>,
    parent: NodeId,
    chain: Chain,
}

impl Scope {
    pub(crate) fn new(runtime: Arc<SpecRuntime>, parent: NodeId, chain: Chain) -> Self {
        Scope {
            runtime,
            parent,
            chain,
        }
    }

    /// The container declarations attach to.
    pub fn node(&self) -> NodeId {
        self.parent
    }

    /// The spec this scope belongs to.
    pub fn spec(&self) -> NodeId {
        self.runtime.spec()
    }

    pub fn tree(&self) -> &ResultTree {
        self.runtime.tree()
    }

    /// Declare a suite. Its body runs when the suite is reached.
    pub fn describe<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        let id = self.runtime.declare_suite(
            self.parent,
            &self.chain,
            name.into(),
            suite_fn(body),
            false,
        );
        self.declared(Target::Node(id))
    }

    /// Declare a suite recorded as skipped. Its body still runs so nested
    /// declarations appear in the report, all of them skipped.
    pub fn xdescribe<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        let id = self.runtime.declare_suite(
            self.parent,
            &self.chain,
            name.into(),
            suite_fn(body),
            true,
        );
        self.declared(Target::Node(id))
    }

    /// Declare a test.
    pub fn it<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.test(name.into(), TestBody::Run(test_fn(body)))
    }

    /// Declare a placeholder test that passes without a body.
    pub fn fit(&self, name: impl Into<String>) -> Declared {
        self.test(name.into(), TestBody::Placeholder)
    }

    /// Declare a test recorded as skipped.
    pub fn xit(&self, name: impl Into<String>) -> Declared {
        self.test(name.into(), TestBody::Excluded)
    }

    /// Alias of [`Scope::xit`] for excluded data-driven tests.
    pub fn xmit(&self, name: impl Into<String>) -> Declared {
        self.xit(name)
    }

    /// Declare a test that runs only when `condition` resolves true.
    pub fn cit<C, F, Fut>(&self, name: impl Into<String>, condition: C, body: F) -> Declared
    where
        C: Into<Condition>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.test(
            name.into(),
            TestBody::Conditional(condition.into(), test_fn(body)),
        )
    }

    /// Declare a test retried on failure.
    pub fn rit<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.test(name.into(), TestBody::Retry(test_fn(body)))
    }

    /// Declare one test per value. Instances are named `"<name> - <n>"`.
    pub fn mit<V, F, Fut>(&self, name: impl Into<String>, values: V, body: F) -> Declared
    where
        V: Into<Values>,
        F: Fn(Value, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        let each: EachTestFn =
            Arc::new(move |value: Value, index: usize| body(value, index).boxed());
        let id = self.runtime.declare_generator(
            self.parent,
            &self.chain,
            name.into(),
            GeneratorKind::Mit,
            values.into(),
            Expansion::Tests(each),
        );
        self.declared(Target::Node(id))
    }

    /// Declare one suite per value.
    pub fn mdescribe<V, F, Fut>(&self, name: impl Into<String>, values: V, body: F) -> Declared
    where
        V: Into<Values>,
        F: Fn(Scope, Value, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        let each: EachSuiteFn = Arc::new(move |scope: Scope, value: Value, index: usize| {
            body(scope, value, index).boxed()
        });
        let id = self.runtime.declare_generator(
            self.parent,
            &self.chain,
            name.into(),
            GeneratorKind::Mdescribe,
            values.into(),
            Expansion::Suites(each),
        );
        self.declared(Target::Node(id))
    }

    /// Register a hook run once before this container's children.
    pub fn before<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::Before, name.into(), test_fn(body))
    }

    pub fn before_all<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.before(name, body)
    }

    /// Register a hook run once after this container's children.
    pub fn after<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::After, name.into(), test_fn(body))
    }

    pub fn after_all<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.after(name, body)
    }

    /// Register a hook run before every direct child test.
    pub fn before_each<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::BeforeEach, name.into(), test_fn(body))
    }

    /// Register a hook run after every direct child test.
    pub fn after_each<F, Fut>(&self, name: impl Into<String>, body: F) -> Declared
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::AfterEach, name.into(), test_fn(body))
    }

    fn test(&self, name: String, body: TestBody) -> Declared {
        let id = self
            .runtime
            .declare_test(self.parent, &self.chain, name, body);
        self.declared(Target::Node(id))
    }

    fn hook(&self, kind: HookKind, name: String, callback: TestFn) -> Declared {
        let index = self.runtime.register_hook(
            self.parent,
            kind,
            HookDef {
                name,
                callback,
                timeout: None,
            },
        );
        self.declared(Target::Hook {
            owner: self.parent,
            kind,
            index,
        })
    }

    fn declared(&self, target: Target) -> Declared {
        Declared {
            runtime: Arc::clone(&self.runtime),
            target,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Node(NodeId),
    Hook {
        owner: NodeId,
        kind: HookKind,
        index: usize,
    },
}

/// Handle returned by every declaration.
pub struct Declared {
    runtime: Arc<SpecRuntime>,
    target: Target,
}

impl Declared {
    /// Override the deadline of this declaration. Zero disables it.
    pub fn timeout(self, timeout: Duration) -> Self {
        match self.target {
            Target::Node(id) => self.runtime.set_timeout(id, timeout),
            Target::Hook { owner, kind, index } => {
                self.runtime.set_hook_timeout(owner, kind, index, timeout)
            }
        }
        self
    }

    /// The declared node; `None` for hooks, whose nodes are created per run.
    pub fn id(&self) -> Option<NodeId> {
        match self.target {
            Target::Node(id) => Some(id),
            Target::Hook { .. } => None,
        }
    }
}
