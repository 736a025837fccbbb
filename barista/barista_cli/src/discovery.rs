//! Spec file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

/// File name suffixes recognised as spec files inside directories
const SPEC_SUFFIXES: [&str; 2] = [".test.toml", ".test.json"];

fn is_spec_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| SPEC_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
        .unwrap_or(false)
}

/// Expand `paths` into spec files.
///
/// Files are taken as given. Directories contribute their spec files,
/// recursively and in sorted order. A path that does not exist is an error.
pub fn collect_specs(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut specs = Vec::new();
    for path in paths {
        if path.is_file() {
            specs.push(path.clone());
        } else if path.is_dir() {
            let mut found = Vec::new();
            walk(path, &mut found)?;
            found.sort();
            specs.extend(found);
        } else {
            bail!("no such file or directory: {}", path.display());
        }
    }
    Ok(specs)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if is_spec_file(&path) {
            found.push(path);
        }
    }
    Ok(())
}
