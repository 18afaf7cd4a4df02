// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod fresh;
pub mod logging;
pub mod registry;
pub mod report;
pub mod runner;
pub mod state;

use std::path::PathBuf;

use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{DagGraph, build_plan};
use crate::errors::{Result, RundagError};
use crate::registry::Registry;
use crate::runner::{Runner, RunnerOptions};
use crate::state::StateStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - registry / graph / plan construction
/// - the state store and the runner
///
/// Returns the process exit code: 0 when every requested task ended
/// `Succeeded` or `Skipped`, 1 for execution failures. Configuration
/// problems surface as errors and map to exit code 2 via
/// [`RundagError::exit_code`].
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let registry = Registry::from_config(&cfg)?;
    registry.check_references()?;

    if args.list {
        print_task_list(&registry);
        return Ok(0);
    }

    let requested = requested_tasks(&args, &cfg, &registry);
    let graph = DagGraph::from_registry(&registry);
    let plan = build_plan(&registry, &graph, &requested)?;

    info!(requested = ?requested, plan = ?plan.tasks(), "execution plan");

    if args.dry_run {
        print_plan(&plan);
        return Ok(0);
    }

    let jobs = args.jobs.unwrap_or(cfg.config.jobs);
    if jobs == 0 {
        return Err(RundagError::Config(
            "--jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    let options = RunnerOptions {
        jobs,
        fail_fast: args.fail_fast || cfg.config.fail_fast,
    };
    let store = StateStore::new(&cfg.config.state_dir);

    let runner = Runner::new(&registry, store, options);
    let report = runner.run(&plan).await;

    report.print_summary();
    Ok(report.exit_code())
}

/// Which tasks to run: CLI arguments, then `[config].default_tasks`, then
/// every declared task.
fn requested_tasks(args: &CliArgs, cfg: &ConfigFile, registry: &Registry) -> Vec<String> {
    if !args.tasks.is_empty() {
        return args.tasks.clone();
    }
    if !cfg.config.default_tasks.is_empty() {
        return cfg.config.default_tasks.clone();
    }
    registry.names().map(|s| s.to_string()).collect()
}

/// `--list` output: declared tasks with their deps and actions.
fn print_task_list(registry: &Registry) {
    println!("tasks ({}):", registry.len());
    for task in registry.tasks() {
        println!("  - {}", task.name);
        if !task.deps.is_empty() {
            println!("      deps: {:?}", task.deps);
        }
        for action in task.actions.iter() {
            println!("      action: {action:?}");
        }
        if !task.file_deps.is_empty() {
            println!("      file_deps: {} file(s)", task.file_deps.len());
        }
        if !task.targets.is_empty() {
            println!("      targets: {:?}", task.targets);
        }
        if task.run_once {
            println!("      run_once: true");
        }
    }
}

/// `--dry-run` output: the plan in execution order.
fn print_plan(plan: &crate::dag::ExecutionPlan) {
    println!("execution plan ({} task(s)):", plan.len());
    for (i, name) in plan.tasks().iter().enumerate() {
        println!("  {:>3}. {name}", i + 1);
    }
}
