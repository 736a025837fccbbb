//! The script host: a sandbox that evaluates declarative spec files.
//!
//! Evaluating a file walks its items and turns each one into the matching
//! declaration on the spec's [`Scope`]. Command bodies are captured in
//! closures and only run when the scheduler reaches them. Suite items are
//! registered lazily, when their suite is entered, so a `require` inside a
//! suite is resolved at that point and its failure fails only that suite.

pub mod command;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use barista_core::{NodeId, SandboxError, TestError, TestResult};
use barista_engine::{Condition, Declared, Sandbox, Scope, Values};
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, trace};

use crate::script::model::{
    CommandItem, ConditionalItem, GeneratorItem, GeneratorSuiteItem, HookItem, SuiteItem,
};
use crate::script::{CommandExpectation, ModuleLoader, ScriptItem};
use command::{parse_values, run_checked, run_command, CommandEnv};

/// Sandbox evaluating TOML and JSON spec files.
#[derive(Default)]
pub struct ScriptHost {
    /// One loader per spec, shared by the preload and the spec file and
    /// released once both are evaluated
    loaders: DashMap<NodeId, Arc<ModuleLoader>>,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of specs whose loader is still held.
    pub fn active_loaders(&self) -> usize {
        self.loaders.len()
    }

    fn loader_for(&self, spec: NodeId) -> Arc<ModuleLoader> {
        self.loaders
            .entry(spec)
            .or_insert_with(|| Arc::new(ModuleLoader::new()))
            .value()
            .clone()
    }
}

#[async_trait]
impl Sandbox for ScriptHost {
    async fn evaluate(&self, file: &Path, api: Scope) -> Result<(), SandboxError> {
        let loader = self.loader_for(api.spec());
        let specifier = file.display().to_string();
        let (path, module) = loader.require(&specifier, None).await?;
        debug!(file = %path.display(), items = module.items.len(), "evaluating spec file");

        let context = Context {
            loader,
            env: CommandEnv::for_spec(&path).extended(&module.env),
            trail: vec![path],
        };
        register_items(api, module.items.clone(), context).await
    }

    fn release(&self, spec: NodeId) {
        // Lazily registered suites keep their own handle on the loader
        if self.loaders.remove(&spec).is_some() {
            debug!(%spec, "module loader released");
        }
    }
}

/// What nested registrations inherit from the file they were declared in
#[derive(Clone)]
struct Context {
    loader: Arc<ModuleLoader>,
    env: CommandEnv,

    /// Files being evaluated, outermost first; the last is the current file
    trail: Vec<PathBuf>,
}

impl Context {
    fn origin(&self) -> Option<&Path> {
        self.trail.last().map(PathBuf::as_path)
    }
}

fn millis(timeout: Option<u64>) -> Option<Duration> {
    timeout.map(Duration::from_millis)
}

fn with_timeout(declared: Declared, timeout: Option<u64>) {
    if let Some(timeout) = millis(timeout) {
        declared.timeout(timeout);
    }
}

/// A test or hook body running `script`.
fn command_body(
    script: String,
    expectation: CommandExpectation,
    env: CommandEnv,
) -> impl Fn() -> BoxFuture<'static, TestResult> + Send + Sync + 'static {
    move || {
        let script = script.clone();
        let expectation = expectation.clone();
        let env = env.clone();
        async move { run_checked(&script, &expectation, &env).await }.boxed()
    }
}

fn values_of(values: Option<Vec<Value>>, generate: Option<String>, env: &CommandEnv) -> Values {
    match (values, generate) {
        (Some(values), _) => Values::Literal(values),
        (None, Some(script)) => {
            let env = env.clone();
            Values::producer(move || async move {
                let output = run_command(&script, &env).await?;
                CommandExpectation::default().check(&output)?;
                Ok(parse_values(&output.stdout))
            })
        }
        (None, None) => Values::Literal(Vec::new()),
    }
}

fn register_items(
    scope: Scope,
    items: Vec<ScriptItem>,
    context: Context,
) -> BoxFuture<'static, Result<(), SandboxError>> {
    async move {
        for item in items {
            trace!(name = item.name().unwrap_or_default(), "registering item");
            match item {
                ScriptItem::Describe(suite) => register_suite(&scope, suite, &context, false),
                ScriptItem::Xdescribe(suite) => register_suite(&scope, suite, &context, true),
                ScriptItem::It(test) => {
                    let CommandItem {
                        name,
                        run,
                        expect,
                        timeout,
                    } = test;
                    let declared = scope.it(name, command_body(run, expect, context.env.clone()));
                    with_timeout(declared, timeout);
                }
                ScriptItem::Rit(test) => {
                    let CommandItem {
                        name,
                        run,
                        expect,
                        timeout,
                    } = test;
                    let declared =
                        scope.rit(name, command_body(run, expect, context.env.clone()));
                    with_timeout(declared, timeout);
                }
                ScriptItem::Fit(item) => {
                    scope.fit(item.name);
                }
                ScriptItem::Xit(item) | ScriptItem::Xmit(item) => {
                    scope.xit(item.name);
                }
                ScriptItem::Cit(item) => register_conditional(&scope, item, &context),
                ScriptItem::Mit(item) => register_each_test(&scope, item, &context),
                ScriptItem::Mdescribe(item) => register_each_suite(&scope, item, &context),
                ScriptItem::Before(hook) => {
                    let (name, body, timeout) = hook_parts(hook, "before", &context);
                    with_timeout(scope.before(name, body), timeout);
                }
                ScriptItem::After(hook) => {
                    let (name, body, timeout) = hook_parts(hook, "after", &context);
                    with_timeout(scope.after(name, body), timeout);
                }
                ScriptItem::BeforeEach(hook) => {
                    let (name, body, timeout) = hook_parts(hook, "beforeEach", &context);
                    with_timeout(scope.before_each(name, body), timeout);
                }
                ScriptItem::AfterEach(hook) => {
                    let (name, body, timeout) = hook_parts(hook, "afterEach", &context);
                    with_timeout(scope.after_each(name, body), timeout);
                }
                ScriptItem::Require(require) => {
                    let (path, module) =
                        context.loader.require(&require.path, context.origin()).await?;
                    if context.trail.contains(&path) {
                        return Err(SandboxError::Evaluation(format!(
                            "circular require of {}",
                            path.display()
                        )));
                    }
                    debug!(path = %path.display(), "registering required module");

                    let mut nested = context.clone();
                    nested.env = context.env.extended(&module.env);
                    nested.trail.push(path);
                    register_items(scope.clone(), module.items.clone(), nested).await?;
                }
            }
        }
        Ok(())
    }
    .boxed()
}

fn hook_parts(
    hook: HookItem,
    default_name: &str,
    context: &Context,
) -> (
    String,
    impl Fn() -> BoxFuture<'static, TestResult> + Send + Sync + 'static,
    Option<u64>,
) {
    let HookItem {
        name,
        run,
        expect,
        timeout,
    } = hook;
    let name = name.unwrap_or_else(|| format!("{} hook", default_name));
    (name, command_body(run, expect, context.env.clone()), timeout)
}

fn register_suite(scope: &Scope, suite: SuiteItem, context: &Context, excluded: bool) {
    let SuiteItem {
        name,
        timeout,
        items,
    } = suite;
    let context = context.clone();
    let body = move |inner: Scope| async move {
        register_items(inner, items, context)
            .await
            .map_err(TestError::from)
    };

    let declared = if excluded {
        scope.xdescribe(name, body)
    } else {
        scope.describe(name, body)
    };
    with_timeout(declared, timeout);
}

fn register_conditional(scope: &Scope, item: ConditionalItem, context: &Context) {
    let ConditionalItem {
        name,
        when,
        when_run,
        run,
        expect,
        timeout,
    } = item;

    let condition = match (when, when_run) {
        (Some(value), _) => Condition::Value(value),
        (None, Some(script)) => {
            let env = context.env.clone();
            Condition::deferred(move || async move {
                run_command(&script, &env)
                    .await
                    .map(|output| output.success())
                    .unwrap_or(false)
            })
        }
        (None, None) => Condition::Value(true),
    };

    let declared = scope.cit(
        name,
        condition,
        command_body(run, expect, context.env.clone()),
    );
    with_timeout(declared, timeout);
}

fn register_each_test(scope: &Scope, item: GeneratorItem, context: &Context) {
    let GeneratorItem {
        name,
        values,
        generate,
        run,
        expect,
        timeout,
    } = item;

    let values = values_of(values, generate, &context.env);
    let env = context.env.clone();
    let declared = scope.mit(name, values, move |value, index| {
        let env = env.with_value(&value, index);
        let script = run.clone();
        let expectation = expect.clone();
        async move { run_checked(&script, &expectation, &env).await }
    });
    with_timeout(declared, timeout);
}

fn register_each_suite(scope: &Scope, item: GeneratorSuiteItem, context: &Context) {
    let GeneratorSuiteItem {
        name,
        values,
        generate,
        timeout,
        items,
    } = item;

    let values = values_of(values, generate, &context.env);
    let context = context.clone();
    let declared = scope.mdescribe(name, values, move |inner, value, index| {
        let mut nested = context.clone();
        nested.env = context.env.with_value(&value, index);
        let items = items.clone();
        async move {
            register_items(inner, items, nested)
                .await
                .map_err(TestError::from)
        }
    });
    with_timeout(declared, timeout);
}
