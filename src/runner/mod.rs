// src/runner/mod.rs

//! Plan execution.
//!
//! The runner walks an [`ExecutionPlan`] with a bounded pool of concurrent
//! workers. A task is dispatched once every dependency is terminal with
//! `Succeeded` or `Skipped`; a failed dependency marks the dependent as
//! failed ("blocked by dependency <name>") without invoking any of its
//! actions. Freshness is evaluated inside the worker just before the
//! actions, and a fresh fingerprint record is persisted on success.

pub mod exec;

use std::collections::HashMap;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::dag::ExecutionPlan;
use crate::fresh::{self, Freshness};
use crate::registry::{Registry, Task};
use crate::report::{RunReport, RunResult, TaskStatus};
use crate::state::{FingerprintRecord, StateStore};

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Number of tasks allowed to run concurrently. With 1, independent
    /// tasks execute strictly in plan (declaration) order.
    pub jobs: usize,
    /// Stop dispatching new tasks once a failure is observed; tasks already
    /// in flight finish.
    pub fail_fast: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            fail_fast: false,
        }
    }
}

/// Per-task slot during a run.
#[derive(Debug)]
enum Slot {
    Pending,
    Running,
    Done(RunResult),
}

/// Executes plans against a registry, recording results per task.
pub struct Runner<'r> {
    registry: &'r Registry,
    store: StateStore,
    options: RunnerOptions,
}

impl<'r> Runner<'r> {
    pub fn new(registry: &'r Registry, store: StateStore, options: RunnerOptions) -> Self {
        Self {
            registry,
            store,
            options,
        }
    }

    /// Run every task of the plan to a terminal state (or until fail-fast
    /// stops dispatching). Returns results in plan order.
    pub async fn run(&self, plan: &ExecutionPlan) -> RunReport {
        let mut slots: HashMap<&str, Slot> = plan
            .tasks()
            .iter()
            .map(|name| (name.as_str(), Slot::Pending))
            .collect();

        let mut workers: JoinSet<(String, RunResult)> = JoinSet::new();
        let mut running = 0usize;
        let mut failure_observed = false;

        loop {
            self.dispatch_ready(plan, &mut slots, &mut workers, &mut running, &mut failure_observed);

            if running == 0 {
                break;
            }

            match workers.join_next().await {
                Some(Ok((name, result))) => {
                    running -= 1;
                    if result.status == TaskStatus::Failed {
                        failure_observed = true;
                    }
                    debug!(task = %name, status = ?result.status, "task reached terminal state");
                    if let Some(slot) = slots.get_mut(name.as_str()) {
                        *slot = Slot::Done(result);
                    }
                }
                Some(Err(join_err)) => {
                    // A worker panicked; the owning slot is resolved below.
                    warn!(%join_err, "worker task panicked");
                    running -= 1;
                    failure_observed = true;
                }
                None => break,
            }
        }

        let mut report = RunReport::default();
        for name in plan.tasks() {
            let result = match slots.remove(name.as_str()) {
                Some(Slot::Done(result)) => result,
                _ => RunResult::failed("did not reach a terminal state"),
            };
            report.push(name.clone(), result);
        }
        report
    }

    /// One pass over the plan in order: mark blocked tasks, apply fail-fast,
    /// and spawn ready tasks while worker capacity remains.
    ///
    /// Dependencies always precede dependents in the plan, so a single
    /// in-order pass propagates "blocked" states all the way downstream.
    fn dispatch_ready<'p>(
        &self,
        plan: &'p ExecutionPlan,
        slots: &mut HashMap<&'p str, Slot>,
        workers: &mut JoinSet<(String, RunResult)>,
        running: &mut usize,
        failure_observed: &mut bool,
    ) {
        for name in plan.tasks() {
            if !matches!(slots.get(name.as_str()), Some(Slot::Pending)) {
                continue;
            }
            let Some(task) = self.registry.get(name) else {
                // Plans are built from this registry; an unknown name would
                // be a bug upstream.
                warn!(task = %name, "task in plan but not in registry");
                continue;
            };

            let mut failed_dep: Option<&str> = None;
            let mut ready = true;
            for dep in task.deps.iter() {
                match slots.get(dep.as_str()) {
                    Some(Slot::Done(result)) if result.status == TaskStatus::Failed => {
                        failed_dep = Some(dep.as_str());
                        break;
                    }
                    Some(Slot::Done(_)) => {}
                    Some(_) => {
                        ready = false;
                        break;
                    }
                    // Deps are always part of the plan's transitive closure.
                    None => {}
                }
            }

            if let Some(dep) = failed_dep {
                info!(task = %name, dep, "blocked by failed dependency");
                slots.insert(
                    name.as_str(),
                    Slot::Done(RunResult::failed(format!("blocked by dependency {dep}"))),
                );
                *failure_observed = true;
                continue;
            }
            if !ready {
                continue;
            }

            if *failure_observed && self.options.fail_fast {
                slots.insert(
                    name.as_str(),
                    Slot::Done(RunResult::failed("not started (fail-fast)")),
                );
                continue;
            }

            if *running >= self.options.jobs {
                // Capacity exhausted; keep scanning only to mark blocked
                // tasks, never to spawn out of order.
                continue;
            }

            slots.insert(name.as_str(), Slot::Running);
            *running += 1;

            let task = task.clone();
            let store = self.store.clone();
            workers.spawn(async move {
                let name = task.name.clone();
                let result = execute_task(task, store).await;
                (name, result)
            });
        }
    }
}

/// Run one task inside a worker: freshness check, actions, then record the
/// new fingerprints and verify declared targets.
async fn execute_task(task: Task, store: StateStore) -> RunResult {
    let record = store.load(&task.name);

    match fresh::evaluate(&task, record.as_ref()) {
        Freshness::UpToDate => {
            info!(task = %task.name, "up to date; skipping");
            return RunResult::skipped();
        }
        Freshness::MustRun(reason) => {
            debug!(task = %task.name, %reason, "must run");
        }
    }

    if let Err(reason) = exec::run_actions(&task).await {
        return RunResult::failed(reason);
    }

    let mut result = RunResult::succeeded();

    // Persist fresh signatures so the next invocation can prove freshness.
    // Failures here only cost a rerun, never the run itself.
    match FingerprintRecord::capture(&task.file_deps) {
        Ok(new_record) => {
            if let Err(err) = store.save(&task.name, &new_record) {
                warn!(task = %task.name, %err, "could not persist fingerprint record");
            }
        }
        Err(err) => {
            warn!(task = %task.name, %err, "could not fingerprint file deps; task will rerun next time");
        }
    }

    for target in task.targets.iter() {
        if !target.exists() {
            warn!(
                task = %task.name,
                target = %target.display(),
                "declared target missing after successful run"
            );
            result.missing_targets.push(target.clone());
        }
    }

    result
}
