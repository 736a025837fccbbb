//! Per-spec scheduling state and the entry points of suites, tests, hooks
//! and generators.
//!
//! The result tree only holds what a report shows. Everything needed to
//! schedule a node (its chains, its hook registries, its timeout override)
//! lives in a `Slot` keyed by the node's id and owned by the `SpecRuntime`
//! of the spec the node belongs to. Slots are dropped when the spec
//! completes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use barista_core::{NodeId, RunConfig, TestError, TestResult};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::chain::{Chain, ChainKind};
use super::envelope::{retry, within, RetryPolicy};
use super::scope::{EachSuiteFn, EachTestFn, Scope, SuiteFn, TestFn};
use crate::model::{GeneratorKind, HookKind, NodeKind, NodeState, ResultTree};
use crate::patterns::event::{EventBus, LifecycleEvent};
use crate::patterns::generator::{instance_name, Values};
use crate::patterns::skip::{self, Condition, SkipReason};

/// A registered hook
#[derive(Clone)]
pub(crate) struct HookDef {
    pub name: String,
    pub callback: TestFn,
    pub timeout: Option<Duration>,
}

#[derive(Default)]
struct HookRegistry {
    before: Vec<HookDef>,
    after: Vec<HookDef>,
    before_each: Vec<HookDef>,
    after_each: Vec<HookDef>,
}

impl HookRegistry {
    fn list(&self, kind: HookKind) -> &Vec<HookDef> {
        match kind {
            HookKind::Before => &self.before,
            HookKind::After => &self.after,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
        }
    }

    fn list_mut(&mut self, kind: HookKind) -> &mut Vec<HookDef> {
        match kind {
            HookKind::Before => &mut self.before,
            HookKind::After => &mut self.after,
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::AfterEach => &mut self.after_each,
        }
    }
}

/// Scheduling state of one node
#[derive(Default)]
struct Slot {
    chains: HashMap<ChainKind, Chain>,
    hooks: HookRegistry,
    timeout: Option<Duration>,
}

/// How a declared test runs
pub(crate) enum TestBody {
    /// Body under the timeout envelope
    Run(TestFn),
    /// Body under the retry envelope
    Retry(TestFn),
    /// Body gated by a condition
    Conditional(Condition, TestFn),
    /// Records a pass without a body
    Placeholder,
    /// Records a skip without evaluating anything
    Excluded,
}

/// How a generator expands its values
pub(crate) enum Expansion {
    Tests(EachTestFn),
    Suites(EachSuiteFn),
}

/// Scheduling state of one spec.
pub struct SpecRuntime {
    tree: ResultTree,
    events: Arc<EventBus>,
    spec: NodeId,
    fast_fail: bool,
    default_timeout: Duration,
    retry: RetryPolicy,
    slots: Mutex<HashMap<NodeId, Slot>>,
}

impl SpecRuntime {
    pub(crate) fn new(
        tree: ResultTree,
        events: Arc<EventBus>,
        config: &RunConfig,
        spec: NodeId,
    ) -> Arc<Self> {
        let runtime = SpecRuntime {
            tree,
            events,
            spec,
            fast_fail: config.fast_fail,
            default_timeout: config.timeout(),
            retry: RetryPolicy::from(&config.retries),
            slots: Mutex::new(HashMap::new()),
        };
        runtime.set_timeout(spec, config.timeout());
        Arc::new(runtime)
    }

    pub fn tree(&self) -> &ResultTree {
        &self.tree
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// The spec node this runtime schedules.
    pub fn spec(&self) -> NodeId {
        self.spec
    }

    /// A chain of `id`, created on first use.
    pub fn chain(&self, id: NodeId, kind: ChainKind) -> Chain {
        self.slots
            .lock()
            .entry(id)
            .or_default()
            .chains
            .entry(kind)
            .or_default()
            .clone()
    }

    pub(crate) fn set_timeout(&self, id: NodeId, timeout: Duration) {
        self.slots.lock().entry(id).or_default().timeout = Some(timeout);
    }

    fn own_timeout(&self, id: NodeId) -> Option<Duration> {
        self.slots.lock().get(&id).and_then(|slot| slot.timeout)
    }

    /// The deadline of `id`: its own override, else the nearest ancestor's,
    /// else the configured default.
    pub fn effective_timeout(&self, id: NodeId) -> Duration {
        // Tree lock first, slot lock second
        let mut lineage = vec![id];
        lineage.extend(self.tree.ancestors(id));

        let slots = self.slots.lock();
        lineage
            .iter()
            .find_map(|node| slots.get(node).and_then(|slot| slot.timeout))
            .unwrap_or(self.default_timeout)
    }

    pub(crate) fn register_hook(&self, owner: NodeId, kind: HookKind, hook: HookDef) -> usize {
        let mut slots = self.slots.lock();
        let list = slots.entry(owner).or_default().hooks.list_mut(kind);
        list.push(hook);
        list.len() - 1
    }

    pub(crate) fn set_hook_timeout(
        &self,
        owner: NodeId,
        kind: HookKind,
        index: usize,
        timeout: Duration,
    ) {
        if let Some(hook) = self
            .slots
            .lock()
            .get_mut(&owner)
            .and_then(|slot| slot.hooks.list_mut(kind).get_mut(index))
        {
            hook.timeout = Some(timeout);
        }
    }

    /// Drop all scheduling state once the spec has completed.
    pub(crate) fn release(&self) {
        self.slots.lock().clear();
    }

    fn parent_of(&self, id: NodeId) -> NodeId {
        self.tree.parent(id).unwrap_or(NodeId::ROOT)
    }

    /// Register a suite under `parent`, queued on `chain`.
    pub(crate) fn declare_suite(
        self: &Arc<Self>,
        parent: NodeId,
        chain: &Chain,
        name: String,
        body: SuiteFn,
        excluded: bool,
    ) -> NodeId {
        let id = self.tree.add(parent, NodeKind::Suite, name);
        debug!(%id, %parent, excluded, "suite declared");

        let runtime = Arc::clone(self);
        chain.then(move || runtime.enter_suite(id, body, excluded));
        id
    }

    /// Register a test under `parent`, queued on `chain`.
    pub(crate) fn declare_test(
        self: &Arc<Self>,
        parent: NodeId,
        chain: &Chain,
        name: String,
        body: TestBody,
    ) -> NodeId {
        let id = self.tree.add(parent, NodeKind::Test, name);
        debug!(%id, %parent, "test declared");

        let runtime = Arc::clone(self);
        chain.then(move || runtime.enter_test(id, body));
        id
    }

    /// Register a generator under `parent`, queued on `chain`.
    pub(crate) fn declare_generator(
        self: &Arc<Self>,
        parent: NodeId,
        chain: &Chain,
        name: String,
        kind: GeneratorKind,
        values: Values,
        expansion: Expansion,
    ) -> NodeId {
        let id = self.tree.add(parent, NodeKind::Generator, name);
        self.tree.update(id, |node| node.generator = Some(kind));
        debug!(%id, %parent, kind = kind.as_str(), "generator declared");

        let runtime = Arc::clone(self);
        chain.then(move || runtime.enter_generator(id, values, expansion));
        id
    }

    fn enter_suite(
        self: Arc<Self>,
        id: NodeId,
        body: SuiteFn,
        excluded: bool,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let parent = self.parent_of(id);
            if !excluded {
                if let Some(reason) = skip::check(&self.tree, parent, self.fast_fail) {
                    debug!(%id, %reason, "suite skipped");
                    self.tree.skip(id);
                    return;
                }
            }

            let state = if excluded {
                debug!(%id, reason = %SkipReason::Excluded, "suite skipped");
                NodeState::Skipped
            } else {
                NodeState::Running
            };
            self.tree.begin(id, state);
            self.events
                .emit(LifecycleEvent::BeforeSuite, id, &self.tree)
                .await;

            let main = self.chain(id, ChainKind::Main);
            let scope = Scope::new(Arc::clone(&self), id, main);
            // Children declared before a body failure still run
            let body_error = match body(scope).await {
                Ok(()) => None,
                Err(error) => {
                    warn!(%id, %error, "suite body failed");
                    Some(error.to_string())
                }
            };

            self.settle_container(id, false).await;
            self.tree.finish_container(id, body_error);
            self.events
                .emit(LifecycleEvent::AfterSuite, id, &self.tree)
                .await;
        })
    }

    /// Drop queued work of a spec whose file failed to evaluate and record
    /// its declared but unstarted children as skipped.
    pub(crate) fn abandon(&self, id: NodeId) {
        let main = self.chain(id, ChainKind::Main);
        let dropped = main.clear();
        self.tree.skip_pending_children(id);
        debug!(%id, dropped, "container abandoned");
    }

    /// Run a container's `before` hooks, its queued children, then its
    /// `after` hooks. Skipped containers run no hooks; an abandoned
    /// container still runs its `after` hooks.
    pub(crate) async fn settle_container(self: &Arc<Self>, id: NodeId, abandoned: bool) {
        let skipped = self.tree.state(id) == Some(NodeState::Skipped);

        if !skipped && !abandoned {
            let before = self.chain(id, ChainKind::Before);
            // Failures are recorded on the scaffolds and feed the skip policy
            let _ = self.run_hooks(id, HookKind::Before, &before).await;
        }

        self.chain(id, ChainKind::Main).settle().await;

        if !skipped {
            let after = self.chain(id, ChainKind::After);
            let _ = self.run_hooks(id, HookKind::After, &after).await;
        }
    }

    fn enter_test(self: Arc<Self>, id: NodeId, body: TestBody) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let parent = self.parent_of(id);

            if let TestBody::Excluded = body {
                debug!(%id, reason = %SkipReason::Excluded, "test skipped");
                self.tree.skip(id);
                return;
            }
            if let Some(reason) = skip::check(&self.tree, parent, self.fast_fail) {
                debug!(%id, %reason, "test skipped");
                self.tree.skip(id);
                return;
            }

            let callback = match body {
                TestBody::Excluded => return,
                TestBody::Placeholder => {
                    self.tree.resolve_now(id, NodeState::Passed);
                    return;
                }
                TestBody::Conditional(condition, callback) => {
                    if !condition.resolve().await {
                        debug!(%id, reason = %SkipReason::Condition, "test skipped");
                        self.tree.skip(id);
                        return;
                    }
                    TestBody::Run(callback)
                }
                other => other,
            };

            self.tree.begin(id, NodeState::Running);
            self.events
                .emit(LifecycleEvent::BeforeTest, id, &self.tree)
                .await;

            let before_each = self.chain(id, ChainKind::BeforeEach);
            let prepared = self
                .run_hooks(parent, HookKind::BeforeEach, &before_each)
                .await;

            let limit = self.effective_timeout(id);
            let outcome = match (prepared, callback) {
                (Err(_), _) => Err(TestError::runtime("beforeEach hook failed")),
                (Ok(()), TestBody::Retry(callback)) => {
                    let attempted = retry(&self.retry, limit, || callback()).await;
                    self.tree
                        .update(id, |node| node.attempts = Some(attempted.attempts));
                    attempted.outcome
                }
                (Ok(()), TestBody::Run(callback)) => within(limit, callback()).await,
                (Ok(()), _) => Ok(()),
            };

            match outcome {
                Ok(()) => self.tree.finish(id, NodeState::Passed, None),
                Err(error) => {
                    warn!(%id, %error, "test failed");
                    self.tree
                        .finish(id, NodeState::Failed, Some(error.to_string()));
                }
            }

            let after_each = self.chain(id, ChainKind::AfterEach);
            let _ = self
                .run_hooks(parent, HookKind::AfterEach, &after_each)
                .await;

            self.events
                .emit(LifecycleEvent::AfterTest, id, &self.tree)
                .await;
        })
    }

    /// Run the `kind` hooks registered on `owner`, one scaffold node per
    /// hook, serialized on `chain`. Returns the first hook failure.
    pub(crate) async fn run_hooks(
        self: &Arc<Self>,
        owner: NodeId,
        kind: HookKind,
        chain: &Chain,
    ) -> TestResult {
        let hooks: Vec<HookDef> = self
            .slots
            .lock()
            .get(&owner)
            .map(|slot| slot.hooks.list(kind).clone())
            .unwrap_or_default();
        if hooks.is_empty() {
            return Ok(());
        }

        let failure: Arc<Mutex<Option<TestError>>> = Arc::new(Mutex::new(None));
        for hook in hooks {
            let scaffold = self.tree.add(owner, NodeKind::Hook, hook.name.clone());
            self.tree.update(scaffold, |node| node.hook = Some(kind));

            let runtime = Arc::clone(self);
            let failure = failure.clone();
            chain.then(move || runtime.run_scaffold(scaffold, owner, hook, failure));
        }
        chain.settle().await;

        let first = failure.lock().take();
        match first {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn run_scaffold(
        self: Arc<Self>,
        scaffold: NodeId,
        owner: NodeId,
        hook: HookDef,
        failure: Arc<Mutex<Option<TestError>>>,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            self.tree.begin(scaffold, NodeState::Running);
            let limit = hook
                .timeout
                .unwrap_or_else(|| self.effective_timeout(owner));

            match within(limit, (hook.callback)()).await {
                Ok(()) => self.tree.finish(scaffold, NodeState::Passed, None),
                Err(error) => {
                    warn!(%scaffold, hook = %hook.name, %error, "hook failed");
                    self.tree
                        .finish(scaffold, NodeState::Failed, Some(error.to_string()));
                    failure.lock().get_or_insert(error);
                }
            }
        })
    }

    fn enter_generator(
        self: Arc<Self>,
        id: NodeId,
        values: Values,
        expansion: Expansion,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let parent = self.parent_of(id);
            if let Some(reason) = skip::check(&self.tree, parent, self.fast_fail) {
                debug!(%id, %reason, "generator skipped");
                self.tree.skip(id);
                return;
            }

            self.tree.begin(id, NodeState::Running);
            let limit = self.effective_timeout(id);
            let values = match values.resolve(limit).await {
                Ok(values) => values,
                Err(error) => {
                    warn!(%id, %error, "generator failed");
                    self.tree
                        .finish(id, NodeState::Failed, Some(error.to_string()));
                    return;
                }
            };
            self.tree.finish(id, NodeState::Passed, None);

            let name = self
                .tree
                .with_node(id, |node| node.name.clone())
                .unwrap_or_default();
            let inherited = self.own_timeout(id);
            let private = self.chain(id, ChainKind::Main);
            debug!(%id, count = values.len(), "expanding generator");

            for (index, value) in values.into_iter().enumerate() {
                let instance = self.declare_instance(parent, &private, &name, &expansion, value, index);
                if let Some(timeout) = inherited {
                    self.set_timeout(instance, timeout);
                }
            }
            private.settle().await;
        })
    }

    fn declare_instance(
        self: &Arc<Self>,
        parent: NodeId,
        chain: &Chain,
        name: &str,
        expansion: &Expansion,
        value: Value,
        index: usize,
    ) -> NodeId {
        let name = instance_name(name, index);
        match expansion {
            Expansion::Tests(each) => {
                let each = each.clone();
                let callback: TestFn = Arc::new(move || each(value.clone(), index));
                self.declare_test(parent, chain, name, TestBody::Run(callback))
            }
            Expansion::Suites(each) => {
                let each = each.clone();
                let body: SuiteFn = Box::new(move |scope: Scope| each(scope, value, index));
                self.declare_suite(parent, chain, name, body, false)
            }
        }
    }
}
