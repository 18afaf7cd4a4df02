// src/fresh/mod.rs

//! Freshness evaluation: decide whether a task must run or is provably
//! up to date relative to its last successful run.
//!
//! The primary signal is the blake3 content hash of every declared file
//! dependency, compared against the persisted [`FingerprintRecord`]. The
//! recorded mtime/length are carried for diagnostics but never trusted on
//! their own: a touch-without-change must not force a rerun, and an
//! mtime-preserving content change must still be detected, so the content
//! hash is always recomputed.

pub mod fingerprint;

pub use fingerprint::{FileSignature, signature_of};

use tracing::debug;

use crate::registry::Task;
use crate::state::FingerprintRecord;

/// Outcome of a freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The task's actions must be invoked; carries the first reason found.
    MustRun(String),
    /// Recorded outputs are provably unaffected since the last success.
    UpToDate,
}

/// Evaluate a task against its persisted record (if any).
///
/// Policy:
/// - no prior record: `MustRun`
/// - any declared target missing on disk: `MustRun`
/// - no file deps, no `run_once`, no custom predicate: `MustRun`
///   (nothing to prove freshness with)
/// - recorded dep set differs from the declared one, or any dep's current
///   content hash differs from the recorded one: `MustRun`
/// - a custom predicate is ANDed with the file-based result: the task is
///   only up to date when both agree.
pub fn evaluate(task: &Task, record: Option<&FingerprintRecord>) -> Freshness {
    let Some(record) = record else {
        return Freshness::MustRun("no previous successful run".to_string());
    };

    for target in task.targets.iter() {
        if !target.exists() {
            return Freshness::MustRun(format!("target missing: {}", target.display()));
        }
    }

    if task.file_deps.is_empty() && !task.run_once && task.uptodate.is_none() {
        return Freshness::MustRun("no freshness signal declared".to_string());
    }

    if let Freshness::MustRun(reason) = compare_file_deps(task, record) {
        return Freshness::MustRun(reason);
    }

    if let Some(pred) = task.uptodate.as_ref() {
        if !pred() {
            return Freshness::MustRun("custom up-to-date predicate reports stale".to_string());
        }
    }

    debug!(task = %task.name, "up to date");
    Freshness::UpToDate
}

fn compare_file_deps(task: &Task, record: &FingerprintRecord) -> Freshness {
    // A dep added or removed since the record was written counts as changed.
    if record.deps.len() != task.file_deps.len() {
        return Freshness::MustRun("set of file dependencies changed".to_string());
    }

    for path in task.file_deps.iter() {
        let key = path.to_string_lossy();
        let Some(recorded) = record.deps.get(key.as_ref()) else {
            return Freshness::MustRun(format!("new file dependency: {}", path.display()));
        };

        let current = match signature_of(path) {
            Ok(sig) => sig,
            Err(err) => {
                return Freshness::MustRun(format!(
                    "cannot fingerprint {}: {err}",
                    path.display()
                ));
            }
        };

        if current.hash != recorded.hash {
            return Freshness::MustRun(format!("changed: {}", path.display()));
        }
    }

    Freshness::UpToDate
}
