//! Spec scheduler.
//!
//! Feeds spec files through a bounded pool of concurrently progressing
//! specs. All specs are driven from the task that calls [`SpecScheduler::run`];
//! concurrency across files is interleaving at await points, and within one
//! file execution stays serial and depth-first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use barista_core::{NodeId, RunConfig, SandboxError, SchedulerError, TestError};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::chain::ChainKind;
use super::runtime::SpecRuntime;
use super::sandbox::Sandbox;
use super::scope::Scope;
use crate::model::{Counts, NodeKind, NodeState, ReportNode, ResultTree};
use crate::patterns::event::{EventBus, LifecycleEvent};

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Terminal state of the root
    pub state: NodeState,

    /// Root counters, one entry per spec
    pub counts: Counts,

    /// The cleaned result tree
    pub report: ReportNode,

    /// Wall-clock duration of the run
    pub elapsed_ms: i64,
}

impl RunSummary {
    /// Process exit status: non-zero when the root failed.
    pub fn exit_code(&self) -> i32 {
        if self.state == NodeState::Failed {
            1
        } else {
            0
        }
    }
}

/// Top-level dispatcher of spec files.
pub struct SpecScheduler {
    config: RunConfig,
    sandbox: Arc<dyn Sandbox>,
    events: Arc<EventBus>,
    tree: ResultTree,
}

impl SpecScheduler {
    /// Create a scheduler. The configuration is validated here.
    pub fn new(config: RunConfig, sandbox: Arc<dyn Sandbox>) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(SpecScheduler {
            config,
            sandbox,
            events: Arc::new(EventBus::new()),
            tree: ResultTree::new(),
        })
    }

    /// The event bus observers subscribe to.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn tree(&self) -> &ResultTree {
        &self.tree
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every file and return the summary of the root.
    pub async fn run(&self, files: Vec<PathBuf>) -> RunSummary {
        let workers = self.config.effective_concurrency();
        info!(specs = files.len(), workers, "run started");

        self.tree.begin(NodeId::ROOT, NodeState::Running);
        self.events
            .emit(LifecycleEvent::Before, NodeId::ROOT, &self.tree)
            .await;

        stream::iter(files)
            .for_each_concurrent(workers, |file| self.run_spec(file))
            .await;

        let state = self.tree.finish_container(NodeId::ROOT, None);
        self.events
            .emit(LifecycleEvent::After, NodeId::ROOT, &self.tree)
            .await;

        let root = self.tree.get(NodeId::ROOT);
        let elapsed_ms = root
            .as_ref()
            .map(|node| node.stop - node.start)
            .unwrap_or_default();
        let counts = root.map(|node| node.counts).unwrap_or_default();
        info!(%state, passed = counts.passed, failed = counts.failed, skipped = counts.skipped, "run finished");

        RunSummary {
            state,
            counts,
            report: self.tree.report(),
            elapsed_ms,
        }
    }

    /// Run one spec file to completion.
    async fn run_spec(&self, file: PathBuf) {
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        let spec = self.tree.add(NodeId::ROOT, NodeKind::Spec, name);
        self.tree.update(spec, |node| node.file = Some(file.clone()));
        self.tree.begin(spec, NodeState::Running);
        info!(file = %file.display(), %spec, "spec started");

        let runtime = SpecRuntime::new(
            self.tree.clone(),
            Arc::clone(&self.events),
            &self.config,
            spec,
        );
        self.events
            .emit(LifecycleEvent::BeforeSpec, spec, &self.tree)
            .await;

        let scope = Scope::new(
            Arc::clone(&runtime),
            spec,
            runtime.chain(spec, ChainKind::Main),
        );
        let error = match self.evaluate(&file, scope).await {
            Ok(()) => None,
            Err(error) => {
                warn!(file = %file.display(), %error, "spec evaluation failed");
                runtime.abandon(spec);
                Some(TestError::from(error).to_string())
            }
        };

        runtime.settle_container(spec, error.is_some()).await;
        let state = self.tree.finish_container(spec, error);
        info!(file = %file.display(), %state, "spec finished");

        self.events
            .emit(LifecycleEvent::AfterSpec, spec, &self.tree)
            .await;
        runtime.release();
    }

    /// Evaluate the preload file, if any, then the spec file itself.
    async fn evaluate(&self, file: &Path, scope: Scope) -> Result<(), SandboxError> {
        let spec = scope.spec();
        let outcome = self.evaluate_files(file, scope).await;
        self.sandbox.release(spec);
        outcome
    }

    async fn evaluate_files(&self, file: &Path, scope: Scope) -> Result<(), SandboxError> {
        if let Some(preload) = &self.config.preload {
            debug!(preload = %preload.display(), "evaluating preload");
            self.sandbox.evaluate(preload, scope.clone()).await?;
        }
        self.sandbox.evaluate(file, scope).await
    }
}
