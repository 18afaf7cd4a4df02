// src/report.rs

//! Per-task results and the run-level summary.

use std::path::PathBuf;

/// Terminal status of one task within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Up to date; actions were not invoked.
    Skipped,
    /// All actions completed.
    Succeeded,
    /// An action failed, a dependency failed, or the task was never started.
    Failed,
}

/// Final result for one task. Created when the task reaches a terminal
/// state; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: TaskStatus,
    /// Failure reason, or the skip/run rationale at debug level.
    pub reason: Option<String>,
    /// Declared targets missing after a successful run (contract violation,
    /// non-fatal).
    pub missing_targets: Vec<PathBuf>,
}

impl RunResult {
    pub fn skipped() -> Self {
        Self {
            status: TaskStatus::Skipped,
            reason: None,
            missing_targets: Vec::new(),
        }
    }

    pub fn succeeded() -> Self {
        Self {
            status: TaskStatus::Succeeded,
            reason: None,
            missing_targets: Vec::new(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            reason: Some(reason.into()),
            missing_targets: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, TaskStatus::Skipped | TaskStatus::Succeeded)
    }
}

/// Results for every task of one run, in plan order.
#[derive(Debug, Default)]
pub struct RunReport {
    results: Vec<(String, RunResult)>,
}

impl RunReport {
    pub fn push(&mut self, task: impl Into<String>, result: RunResult) {
        self.results.push((task.into(), result));
    }

    pub fn get(&self, task: &str) -> Option<&RunResult> {
        self.results
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RunResult)> {
        self.results.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when every task ended `Succeeded` or `Skipped`.
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }

    /// Process exit code for this run: 0 when everything is ok, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_ok() { 0 } else { 1 }
    }

    /// Print the run-level summary: one line per task, reasons for failures,
    /// and any target-contract violations.
    pub fn print_summary(&self) {
        for (name, result) in self.results.iter() {
            let label = match result.status {
                TaskStatus::Skipped => "-- (up to date)",
                TaskStatus::Succeeded => "ok",
                TaskStatus::Failed => "FAILED",
            };
            match result.reason.as_deref() {
                Some(reason) if result.status == TaskStatus::Failed => {
                    println!("{label:<16} {name}: {reason}");
                }
                _ => println!("{label:<16} {name}"),
            }
            for target in result.missing_targets.iter() {
                println!("{:<16} {name}: declared target missing: {}", "warning", target.display());
            }
        }
    }
}
