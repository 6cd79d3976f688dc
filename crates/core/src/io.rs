//! Shared filesystem helpers for pipeline steps.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use glob::glob;
use log::error;

/// Find UFO directories (or any glob match) under `dir`.
pub fn glob_ufos(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = dir.join(pattern);
    let pattern_str = pattern.to_str().context("Invalid pattern path")?;
    Ok(glob(pattern_str)
        .with_context(|| format!("Failed to glob pattern: {pattern_str}"))?
        .filter_map(Result::ok)
        .collect())
}

/// Check batch operation results, log failures, and bail if any failed.
pub fn check_results<T>(results: &[Result<T>], operation: &str) -> Result<()> {
    let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

    if !errors.is_empty() {
        for err in &errors {
            error!("{operation}: {err:#}");
        }
        bail!("{operation} failed for {} files", errors.len());
    }
    Ok(())
}

/// Check batch operation results with paths, log failures with file names,
/// and bail if any failed.
pub fn check_results_with_paths<T, P: AsRef<Path>>(
    results: &[(P, Result<T>)],
    operation: &str,
) -> Result<()> {
    let errors: Vec<_> = results
        .iter()
        .filter_map(|(path, r)| r.as_ref().err().map(|e| (path.as_ref(), e)))
        .collect();

    if !errors.is_empty() {
        for (path, err) in &errors {
            error!("{}: {err:#}", path.display());
        }
        bail!("{operation} failed for {} files", errors.len());
    }
    Ok(())
}
