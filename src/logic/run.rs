//! Run discovery
//!
//! A corpus root holds one subdirectory per simulation run. Runs are
//! returned sorted by name so corpus row order is reproducible.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Identifier of one simulation run (its directory name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(name: &str) -> Self {
        RunId(name.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One run directory inside a corpus
#[derive(Debug, Clone)]
pub struct RunDir {
    pub id: RunId,
    pub path: PathBuf,
}

impl RunDir {
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// List the immediate subdirectories of `root` as runs
pub fn discover_runs(root: &Path) -> PipelineResult<Vec<RunDir>> {
    if !root.is_dir() {
        return Err(PipelineError::missing(root));
    }

    let mut runs: Vec<RunDir> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            Some(RunDir {
                id: RunId::new(&name),
                path,
            })
        })
        .collect();

    runs.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::debug!(root = %root.display(), runs = runs.len(), "Runs discovered");
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_runs_sorted_dirs_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("run-b")).unwrap();
        fs::create_dir(dir.path().join("run-a")).unwrap();
        fs::write(dir.path().join("labels.csv"), "RUN,NODE,Label\n").unwrap();

        let runs = discover_runs(dir.path()).unwrap();
        let names: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["run-a", "run-b"]);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_runs(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile { .. }));
    }
}
