// tests/runner_behaviour.rs

use std::error::Error;
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use rundag::dag::{DagGraph, build_plan};
use rundag::registry::{Registry, Task};
use rundag::report::{RunReport, TaskStatus};
use rundag::runner::{Runner, RunnerOptions};
use rundag::state::StateStore;

type TestResult = Result<(), Box<dyn Error>>;

async fn run_tasks(
    registry: &Registry,
    requested: &[&str],
    state_dir: &Path,
    options: RunnerOptions,
) -> RunReport {
    let graph = DagGraph::from_registry(registry);
    let names: Vec<String> = requested.iter().map(|s| s.to_string()).collect();
    let plan = build_plan(registry, &graph, &names).unwrap();

    let runner = Runner::new(registry, StateStore::new(state_dir), options);
    runner.run(&plan).await
}

fn append_cmd(log: &Path, line: &str) -> String {
    format!("echo {line} >> {}", log.display())
}

#[tokio::test]
async fn single_worker_runs_independent_tasks_in_declaration_order() -> TestResult {
    let dir = tempdir()?;
    let log = dir.path().join("order.log");

    let mut reg = Registry::new();
    reg.register(Task::new("a").shell(append_cmd(&log, "a")))?;
    reg.register(Task::new("b").shell(append_cmd(&log, "b")))?;
    reg.register(Task::new("c").shell(append_cmd(&log, "c")))?;

    let report = run_tasks(
        &reg,
        &["a", "b", "c"],
        &dir.path().join("state"),
        RunnerOptions::default(),
    )
    .await;

    assert!(report.all_ok());
    assert_eq!(fs::read_to_string(&log)?, "a\nb\nc\n");
    Ok(())
}

#[tokio::test]
async fn failed_dependency_blocks_dependent_without_running_it() -> TestResult {
    let dir = tempdir()?;
    let marker = dir.path().join("test-ran");

    let mut reg = Registry::new();
    reg.register(Task::new("build").shell("exit 1"))?;
    reg.register(
        Task::new("test")
            .dep("build")
            .shell(format!("touch {}", marker.display())),
    )?;

    let report = run_tasks(
        &reg,
        &["test"],
        &dir.path().join("state"),
        RunnerOptions::default(),
    )
    .await;

    assert_eq!(report.get("build").unwrap().status, TaskStatus::Failed);

    let test = report.get("test").unwrap();
    assert_eq!(test.status, TaskStatus::Failed);
    assert_eq!(
        test.reason.as_deref(),
        Some("blocked by dependency build")
    );
    assert!(!marker.exists(), "blocked task must not run any actions");
    assert_eq!(report.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn second_run_skips_everything_when_nothing_changed() -> TestResult {
    let dir = tempdir()?;
    let state = dir.path().join("state");
    let input = dir.path().join("input.txt");
    let log = dir.path().join("runs.log");
    fs::write(&input, "v1")?;

    let mut reg = Registry::new();
    reg.register(
        Task::new("build")
            .file_dep(&input)
            .shell(append_cmd(&log, "build")),
    )?;
    reg.register(
        Task::new("test")
            .dep("build")
            .file_dep(&input)
            .shell(append_cmd(&log, "test")),
    )?;

    let first = run_tasks(&reg, &["test"], &state, RunnerOptions::default()).await;
    assert_eq!(first.get("build").unwrap().status, TaskStatus::Succeeded);
    assert_eq!(first.get("test").unwrap().status, TaskStatus::Succeeded);

    let second = run_tasks(&reg, &["test"], &state, RunnerOptions::default()).await;
    assert_eq!(second.get("build").unwrap().status, TaskStatus::Skipped);
    assert_eq!(second.get("test").unwrap().status, TaskStatus::Skipped);
    assert_eq!(second.exit_code(), 0);

    // Actions ran exactly once per task.
    assert_eq!(fs::read_to_string(&log)?, "build\ntest\n");

    // Touching the content runs the chain again.
    fs::write(&input, "v2")?;
    let third = run_tasks(&reg, &["test"], &state, RunnerOptions::default()).await;
    assert_eq!(third.get("build").unwrap().status, TaskStatus::Succeeded);
    assert_eq!(third.get("test").unwrap().status, TaskStatus::Succeeded);
    Ok(())
}

#[tokio::test]
async fn task_without_freshness_signal_always_runs() -> TestResult {
    let dir = tempdir()?;
    let state = dir.path().join("state");
    let log = dir.path().join("runs.log");

    let mut reg = Registry::new();
    reg.register(Task::new("lint").shell(append_cmd(&log, "lint")))?;

    for _ in 0..2 {
        let report = run_tasks(&reg, &["lint"], &state, RunnerOptions::default()).await;
        assert_eq!(report.get("lint").unwrap().status, TaskStatus::Succeeded);
    }

    assert_eq!(fs::read_to_string(&log)?, "lint\nlint\n");
    Ok(())
}

#[tokio::test]
async fn fail_fast_stops_dispatching_after_first_failure() -> TestResult {
    let dir = tempdir()?;
    let marker = dir.path().join("b-ran");

    let mut reg = Registry::new();
    reg.register(Task::new("a").shell("exit 7"))?;
    reg.register(Task::new("b").shell(format!("touch {}", marker.display())))?;

    let options = RunnerOptions {
        jobs: 1,
        fail_fast: true,
    };
    let report = run_tasks(&reg, &["a", "b"], &dir.path().join("state"), options).await;

    assert_eq!(report.get("a").unwrap().status, TaskStatus::Failed);
    let b = report.get("b").unwrap();
    assert_eq!(b.status, TaskStatus::Failed);
    assert_eq!(b.reason.as_deref(), Some("not started (fail-fast)"));
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn without_fail_fast_siblings_still_run() -> TestResult {
    let dir = tempdir()?;
    let marker = dir.path().join("b-ran");

    let mut reg = Registry::new();
    reg.register(Task::new("a").shell("exit 7"))?;
    reg.register(Task::new("b").shell(format!("touch {}", marker.display())))?;

    let report = run_tasks(
        &reg,
        &["a", "b"],
        &dir.path().join("state"),
        RunnerOptions::default(),
    )
    .await;

    assert_eq!(report.get("a").unwrap().status, TaskStatus::Failed);
    assert_eq!(report.get("b").unwrap().status, TaskStatus::Succeeded);
    assert!(marker.exists());
    assert_eq!(report.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_declared_target_is_reported_but_not_fatal() -> TestResult {
    let dir = tempdir()?;
    let target = dir.path().join("out.bin");

    let mut reg = Registry::new();
    reg.register(Task::new("build").shell("true").target(&target))?;

    let report = run_tasks(
        &reg,
        &["build"],
        &dir.path().join("state"),
        RunnerOptions::default(),
    )
    .await;

    let build = report.get("build").unwrap();
    assert_eq!(build.status, TaskStatus::Succeeded);
    assert_eq!(build.missing_targets, vec![target]);
    assert_eq!(report.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_workers_respect_dependency_edges() -> TestResult {
    let dir = tempdir()?;
    let log = dir.path().join("order.log");

    let mut reg = Registry::new();
    reg.register(Task::new("build").shell(append_cmd(&log, "build")))?;
    reg.register(
        Task::new("test")
            .dep("build")
            .shell(append_cmd(&log, "test")),
    )?;
    reg.register(
        Task::new("docs")
            .dep("build")
            .shell(append_cmd(&log, "docs")),
    )?;

    let options = RunnerOptions {
        jobs: 4,
        fail_fast: false,
    };
    let report = run_tasks(&reg, &["test", "docs"], &dir.path().join("state"), options).await;
    assert!(report.all_ok());

    let lines: Vec<String> = fs::read_to_string(&log)?
        .lines()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(lines.len(), 3);
    // "build" must come first; "test"/"docs" order is unspecified.
    assert_eq!(lines[0], "build");
    assert!(lines.contains(&"test".to_string()));
    assert!(lines.contains(&"docs".to_string()));
    Ok(())
}
