//! Module loader.
//!
//! Resolves `require` specifiers to spec fragments and caches one parsed
//! module per canonical path. A loader belongs to exactly one spec, so
//! different specs never observe each other's cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use barista_core::SandboxError;
use dashmap::DashMap;
use tracing::debug;

use super::model::ScriptModule;

/// Extensions tried, in order, after the literal specifier
const EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Loads and caches spec modules.
#[derive(Debug)]
pub struct ModuleLoader {
    cache: DashMap<PathBuf, Arc<ScriptModule>>,
    cwd: PathBuf,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_cwd(cwd)
    }

    /// A loader whose last-resort base directory is `cwd`.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        ModuleLoader {
            cache: DashMap::new(),
            cwd: cwd.into(),
        }
    }

    /// Number of cached modules.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Candidate files for `specifier` below one base directory.
    fn candidates(base: &Path, specifier: &str) -> Vec<PathBuf> {
        let literal = base.join(specifier);
        let mut candidates = vec![literal.clone()];
        for extension in EXTENSIONS {
            candidates.push(PathBuf::from(format!("{}.{}", literal.display(), extension)));
        }
        for extension in EXTENSIONS {
            candidates.push(literal.join(format!("index.{}", extension)));
        }
        candidates
    }

    /// Find the file `specifier` names, relative to the directory of `from`
    /// first and to the working directory second.
    pub async fn resolve(
        &self,
        specifier: &str,
        from: Option<&Path>,
    ) -> Result<PathBuf, SandboxError> {
        let mut bases = Vec::new();
        if let Some(dir) = from.and_then(Path::parent) {
            bases.push(dir.to_path_buf());
        }
        bases.push(self.cwd.clone());

        for base in bases {
            for candidate in Self::candidates(&base, specifier) {
                let is_file = tokio::fs::metadata(&candidate)
                    .await
                    .map(|meta| meta.is_file())
                    .unwrap_or(false);
                if is_file {
                    return tokio::fs::canonicalize(&candidate).await.map_err(|e| {
                        SandboxError::Read {
                            path: candidate.clone(),
                            reason: e.to_string(),
                        }
                    });
                }
            }
        }

        Err(SandboxError::Resolution(specifier.to_string()))
    }

    /// Load the module at a resolved path, reading it only once.
    pub async fn load(&self, path: &Path) -> Result<Arc<ScriptModule>, SandboxError> {
        if let Some(module) = self.cache.get(path).map(|entry| Arc::clone(entry.value())) {
            debug!(path = %path.display(), "cache hit");
            return Ok(module);
        }
        debug!(path = %path.display(), "cache miss");

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SandboxError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let module = Arc::new(parse_module(path, &text)?);

        // Another evaluation may have raced us; keep whichever landed first
        let module = self
            .cache
            .entry(path.to_path_buf())
            .or_insert(module)
            .value()
            .clone();
        Ok(module)
    }

    /// Resolve and load `specifier` as seen from `from`.
    pub async fn require(
        &self,
        specifier: &str,
        from: Option<&Path>,
    ) -> Result<(PathBuf, Arc<ScriptModule>), SandboxError> {
        let path = self.resolve(specifier, from).await?;
        let module = self.load(&path).await?;
        Ok((path, module))
    }
}

/// Parse a module, choosing the format by file extension. Anything that is
/// not `.json` is read as TOML.
pub fn parse_module(path: &Path, text: &str) -> Result<ScriptModule, SandboxError> {
    let is_json = path
        .extension()
        .map(|extension| extension.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let parsed = if is_json {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        toml::from_str(text).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| SandboxError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}
