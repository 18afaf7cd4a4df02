// src/registry.rs

//! Task definitions and the per-invocation registry.
//!
//! The registry is an explicit value built once per invocation and passed by
//! reference into the graph builder and the runner; there is no process-wide
//! task table. Declaration order is preserved and used as the deterministic
//! tie-break between independent tasks.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{ConfigFile, TaskConfig};
use crate::errors::{Result, RundagError};

/// A structured callable step.
pub type StepFn = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Custom up-to-date predicate, combined with file-based checks via AND.
pub type UpToDateFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// One executable step of a task.
///
/// Shell commands and structured callables are invoked uniformly by the
/// runner; it only observes success or failure.
#[derive(Clone)]
pub enum Action {
    /// A shell command line, run via `sh -c` (or `cmd /C` on Windows).
    Shell(String),
    /// An in-process callable.
    Fn(StepFn),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shell(cmd) => f.debug_tuple("Shell").field(cmd).finish(),
            Action::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// A named unit of work with actions, dependencies, and freshness signals.
#[derive(Clone)]
pub struct Task {
    pub name: String,
    pub actions: Vec<Action>,
    /// Concrete files whose content decides freshness (globs already expanded).
    pub file_deps: Vec<PathBuf>,
    /// Files this task promises to produce.
    pub targets: Vec<PathBuf>,
    /// Names of tasks that must complete first.
    pub deps: Vec<String>,
    /// Up to date after any prior successful run, regardless of file state.
    pub run_once: bool,
    /// Optional custom predicate, ANDed with file-based checks.
    pub uptodate: Option<UpToDateFn>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("actions", &self.actions)
            .field("file_deps", &self.file_deps)
            .field("targets", &self.targets)
            .field("deps", &self.deps)
            .field("run_once", &self.run_once)
            .field("uptodate", &self.uptodate.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
            file_deps: Vec::new(),
            targets: Vec::new(),
            deps: Vec::new(),
            run_once: false,
            uptodate: None,
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn shell(self, cmd: impl Into<String>) -> Self {
        self.action(Action::Shell(cmd.into()))
    }

    pub fn file_dep(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_deps.push(path.into());
        self
    }

    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.targets.push(path.into());
        self
    }

    pub fn dep(mut self, task: impl Into<String>) -> Self {
        self.deps.push(task.into());
        self
    }

    pub fn run_once(mut self) -> Self {
        self.run_once = true;
        self
    }

    pub fn uptodate(mut self, pred: UpToDateFn) -> Self {
        self.uptodate = Some(pred);
        self
    }
}

/// Something that contributes task descriptors to a registry, e.g. a linter
/// or test-runner wrapper. The engine treats the supplied actions opaquely.
pub trait TaskProvider {
    fn tasks(&self) -> Vec<Task>;
}

/// Ordered set of declared tasks, unique by name.
#[derive(Debug, Default)]
pub struct Registry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a validated [`ConfigFile`], expanding any glob
    /// patterns in `file_deps` to concrete files.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut registry = Self::new();
        for tc in cfg.task.iter() {
            registry.register(task_from_config(tc)?)?;
        }
        Ok(registry)
    }

    /// Add a single task. Fails on a duplicate name.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.index.contains_key(&task.name) {
            return Err(RundagError::Config(format!(
                "duplicate task name '{}'",
                task.name
            )));
        }
        debug!(task = %task.name, deps = ?task.deps, "registered task");
        self.index.insert(task.name.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Add every task supplied by a provider.
    pub fn register_provider(&mut self, provider: &dyn TaskProvider) -> Result<()> {
        for task in provider.tasks() {
            self.register(task)?;
        }
        Ok(())
    }

    /// Check that every `deps` entry resolves to a declared task.
    pub fn check_references(&self) -> Result<()> {
        for task in self.tasks.iter() {
            for dep in task.deps.iter() {
                if !self.index.contains_key(dep) {
                    return Err(RundagError::UnknownTask {
                        task: task.name.clone(),
                        dep: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declaration index of a task, used for deterministic tie-breaks.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Task names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn task_from_config(tc: &TaskConfig) -> Result<Task> {
    let mut task = Task::new(&tc.name);

    for cmd in tc.actions.iter() {
        task = task.shell(cmd);
    }
    task.deps = tc.deps.clone();
    task.run_once = tc.run_once;
    task.targets = tc.targets.iter().map(PathBuf::from).collect();
    task.file_deps = expand_file_deps(&tc.name, &tc.file_deps)?;

    Ok(task)
}

/// Expand `file_deps` entries: glob patterns become the sorted set of files
/// matching right now; literal paths are kept even when absent (a missing
/// dep file simply forces MustRun later).
fn expand_file_deps(task: &str, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    for pattern in patterns {
        if !is_glob(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }

        let paths = glob::glob(pattern).map_err(|e| {
            RundagError::Config(format!(
                "task '{task}': invalid file_deps pattern '{pattern}': {e}"
            ))
        })?;

        let mut matched: Vec<PathBuf> = paths
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        matched.sort();
        debug!(task, pattern = %pattern, files = matched.len(), "expanded file_deps glob");
        out.extend(matched);
    }

    Ok(out)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}
