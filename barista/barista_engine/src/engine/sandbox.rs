//! Sandbox collaborator.
//!
//! A sandbox evaluates one spec file against the registration context of
//! its spec. Evaluation only declares work; the scheduler runs it later.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use barista_core::{NodeId, SandboxError};
use tracing::debug;

use super::scope::Scope;

/// Evaluates spec files.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Evaluate a spec file.
    ///
    /// # Arguments
    ///
    /// * `file` - Path of the spec file.
    /// * `api` - Registration context bound to the file's spec node.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If every declaration in the file was registered.
    /// * `Err(SandboxError)` - If the file could not be read, parsed or
    ///   evaluated. The spec is then recorded as failed.
    async fn evaluate(&self, file: &Path, api: Scope) -> Result<(), SandboxError>;

    /// Drop per-spec state once every file of `spec` has been evaluated.
    fn release(&self, _spec: NodeId) {}
}

/// Registration function of an in-memory spec
pub type SpecFn = Arc<dyn Fn(Scope) -> Result<(), SandboxError> + Send + Sync>;

/// A sandbox whose "files" are registration functions keyed by path.
#[derive(Default, Clone)]
pub struct InlineSandbox {
    specs: HashMap<PathBuf, SpecFn>,
}

impl InlineSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the spec evaluated for `path`.
    pub fn with_spec<F>(mut self, path: impl Into<PathBuf>, spec: F) -> Self
    where
        F: Fn(Scope) -> Result<(), SandboxError> + Send + Sync + 'static,
    {
        self.specs.insert(path.into(), Arc::new(spec));
        self
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.specs.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl Sandbox for InlineSandbox {
    async fn evaluate(&self, file: &Path, api: Scope) -> Result<(), SandboxError> {
        let spec = self
            .specs
            .get(file)
            .ok_or_else(|| SandboxError::Resolution(file.display().to_string()))?;
        debug!(file = %file.display(), "evaluating inline spec");
        spec(api)
    }
}
