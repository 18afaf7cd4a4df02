// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// default_tasks = ["lint", "test"]
/// jobs = 1
///
/// [[task]]
/// name = "test"
/// actions = ["cargo test"]
/// file_deps = ["src/**/*.rs"]
/// deps = ["build"]
/// ```
///
/// Tasks are an array of tables rather than a `[task.<name>]` map so that
/// declaration order survives deserialization; the scheduler uses it as the
/// deterministic tie-break between independent tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[[task]]`, in declaration order.
    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Tasks run when the CLI is invoked without task names.
    ///
    /// Empty means "every declared task".
    #[serde(default)]
    pub default_tasks: Vec<String>,

    /// Number of tasks allowed to run concurrently (CLI `--jobs` overrides).
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Stop dispatching new tasks after the first failure.
    #[serde(default)]
    pub fail_fast: bool,

    /// Directory holding persisted fingerprint records.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_jobs() -> usize {
    1
}

fn default_state_dir() -> String {
    ".rundag".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            default_tasks: Vec::new(),
            jobs: default_jobs(),
            fail_fast: false,
            state_dir: default_state_dir(),
        }
    }
}

/// `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Unique task name.
    pub name: String,

    /// Shell commands to run, in order. May be empty for pure grouping tasks.
    #[serde(default)]
    pub actions: Vec<String>,

    /// Files whose content decides whether this task is up to date.
    ///
    /// Entries may be glob patterns (`src/**/*.rs`); they are expanded to
    /// concrete files when the registry is built. A literal path that does
    /// not exist yet is kept as-is.
    #[serde(default)]
    pub file_deps: Vec<String>,

    /// Files this task promises to produce.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Names of tasks that must complete before this one.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Treat the task as up to date after any prior successful run,
    /// regardless of file state.
    #[serde(default)]
    pub run_once: bool,
}
