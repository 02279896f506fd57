//! In-process workspace model.
//!
//! The external analysis framework owns the real workspace store; this crate
//! only consumes a narrow slice of it: a named matrix workspace with X bin
//! edges, a sample array, and a run-log mapping. `WorkspaceRegistry` is the
//! seam for that store — passed explicitly into every component that needs
//! it, so tests run against [`InMemoryRegistry`] and production code can
//! bridge to the framework's analysis data service.

mod file;

pub use file::{read_cache_file, write_cache_file, CacheFile, NamedWorkspace};

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Latest value of a run log. Run logs are time series in the framework;
/// only the last value is ever consumed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogValue {
    Text(String),
    Number(f64),
}

impl LogValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Run-log mapping on a matrix workspace. Ordered so serialized workspaces
/// are byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLog(BTreeMap<String, LogValue>);

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Last value of the named log, if recorded.
    pub fn last_value(&self, name: &str) -> Option<&LogValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<LogValue>) {
        self.0.insert(name.into(), value.into());
    }
}

/// The slice of a framework matrix workspace this crate consumes: X bin
/// edges, the sample array, and run logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixWorkspace {
    /// Bin edges, length `num_bins() + 1`.
    pub x: Vec<f64>,
    /// Sample values, one per bin.
    pub y: Vec<f64>,
    /// Run metadata.
    pub run: RunLog,
}

impl MatrixWorkspace {
    /// Workspace with the given bin edges and a zeroed sample array.
    pub fn with_bin_edges(x: Vec<f64>, run: RunLog) -> Self {
        let bins = x.len().saturating_sub(1);
        Self {
            x,
            y: vec![0.0; bins],
            run,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.x.len().saturating_sub(1)
    }

    pub fn x_min(&self) -> f64 {
        self.x.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn x_max(&self) -> f64 {
        self.x.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Named-workspace store interface.
///
/// Mirrors the framework operations the cache relies on: existence check,
/// retrieval, add-or-replace, rename, and delete, all keyed by name.
pub trait WorkspaceRegistry {
    fn exists(&self, name: &str) -> bool;

    fn get(&self, name: &str) -> Option<&MatrixWorkspace>;

    fn get_mut(&mut self, name: &str) -> Option<&mut MatrixWorkspace>;

    /// Insert under `name`, replacing any previous holder of that name.
    fn add_or_replace(&mut self, name: &str, workspace: MatrixWorkspace);

    /// Rename `from` to `to`, replacing any previous holder of `to`.
    fn rename(&mut self, from: &str, to: &str) -> Result<()>;

    fn remove(&mut self, name: &str) -> Option<MatrixWorkspace>;
}

/// HashMap-backed registry. The production bridge to the framework store
/// implements the same trait; tests use this directly.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    workspaces: HashMap<String, MatrixWorkspace>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}

impl WorkspaceRegistry for InMemoryRegistry {
    fn exists(&self, name: &str) -> bool {
        self.workspaces.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&MatrixWorkspace> {
        self.workspaces.get(name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut MatrixWorkspace> {
        self.workspaces.get_mut(name)
    }

    fn add_or_replace(&mut self, name: &str, workspace: MatrixWorkspace) {
        self.workspaces.insert(name.to_string(), workspace);
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let ws = self
            .workspaces
            .remove(from)
            .ok_or_else(|| Error::WorkspaceNotFound(from.to_string()))?;
        self.workspaces.insert(to.to_string(), ws);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Option<MatrixWorkspace> {
        self.workspaces.remove(name)
    }
}
