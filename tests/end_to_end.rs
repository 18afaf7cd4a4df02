// tests/end_to_end.rs
//
// Full-stack runs through `rundag::run`: TOML config on disk, CLI args,
// exit codes. Paths inside the configs are absolute so the tests are
// independent of the process working directory.

use std::error::Error;
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use rundag::cli::CliArgs;
use rundag::errors::RundagError;

type TestResult = Result<(), Box<dyn Error>>;

fn args_for(config: &Path) -> CliArgs {
    CliArgs {
        tasks: Vec::new(),
        config: config.display().to_string(),
        jobs: None,
        fail_fast: false,
        list: false,
        dry_run: false,
        log_level: None,
    }
}

#[tokio::test]
async fn config_driven_run_is_incremental_across_invocations() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();

    let input = root.join("input.txt");
    let log = root.join("runs.log");
    fs::write(&input, "v1")?;

    let config_path = root.join("Rundag.toml");
    fs::write(
        &config_path,
        format!(
            r#"
            [config]
            default_tasks = ["build"]
            state_dir = "{state}"

            [[task]]
            name = "build"
            actions = ["echo build >> {log}"]
            file_deps = ["{input}"]
            "#,
            state = root.join(".rundag").display(),
            log = log.display(),
            input = input.display(),
        ),
    )?;

    let code = rundag::run(args_for(&config_path)).await?;
    assert_eq!(code, 0);

    // Nothing changed: second invocation skips and still exits 0.
    let code = rundag::run(args_for(&config_path)).await?;
    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&log)?, "build\n");

    fs::write(&input, "v2")?;
    let code = rundag::run(args_for(&config_path)).await?;
    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&log)?, "build\nbuild\n");
    Ok(())
}

#[tokio::test]
async fn failing_task_yields_exit_code_one() -> TestResult {
    let dir = tempdir()?;
    let config_path = dir.path().join("Rundag.toml");
    fs::write(
        &config_path,
        r#"
        [[task]]
        name = "broken"
        actions = ["exit 9"]
        "#,
    )?;

    let code = rundag::run(args_for(&config_path)).await?;
    assert_eq!(code, 1);
    Ok(())
}

#[tokio::test]
async fn cyclic_config_is_a_configuration_error() -> TestResult {
    let dir = tempdir()?;
    let config_path = dir.path().join("Rundag.toml");
    fs::write(
        &config_path,
        r#"
        [[task]]
        name = "a"
        deps = ["b"]

        [[task]]
        name = "b"
        deps = ["a"]
        "#,
    )?;

    let err = rundag::run(args_for(&config_path)).await.unwrap_err();
    match &err {
        RundagError::Cycle { cycle } => {
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        other => panic!("expected Cycle, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
    Ok(())
}

#[tokio::test]
async fn cycle_outside_the_requested_subgraph_still_aborts_the_run() -> TestResult {
    let dir = tempdir()?;
    let marker = dir.path().join("c-ran");
    let config_path = dir.path().join("Rundag.toml");
    fs::write(
        &config_path,
        format!(
            r#"
            [[task]]
            name = "a"
            deps = ["b"]

            [[task]]
            name = "b"
            deps = ["a"]

            [[task]]
            name = "c"
            actions = ["touch {marker}"]
            "#,
            marker = marker.display(),
        ),
    )?;

    let mut args = args_for(&config_path);
    args.tasks = vec!["c".to_string()];

    let err = rundag::run(args).await.unwrap_err();
    assert!(matches!(&err, RundagError::Cycle { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!marker.exists(), "no task may run with a cyclic registry");
    Ok(())
}

#[tokio::test]
async fn unknown_dependency_is_a_configuration_error() -> TestResult {
    let dir = tempdir()?;
    let config_path = dir.path().join("Rundag.toml");
    fs::write(
        &config_path,
        r#"
        [[task]]
        name = "test"
        deps = ["build"]
        "#,
    )?;

    let err = rundag::run(args_for(&config_path)).await.unwrap_err();
    assert!(matches!(&err, RundagError::UnknownTask { task, dep }
        if task == "test" && dep == "build"));
    assert_eq!(err.exit_code(), 2);
    Ok(())
}

#[tokio::test]
async fn requested_task_selects_only_its_subgraph() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    let log = root.join("runs.log");

    let config_path = root.join("Rundag.toml");
    fs::write(
        &config_path,
        format!(
            r#"
            [config]
            state_dir = "{state}"

            [[task]]
            name = "build"
            actions = ["echo build >> {log}"]

            [[task]]
            name = "test"
            deps = ["build"]
            actions = ["echo test >> {log}"]

            [[task]]
            name = "docs"
            actions = ["echo docs >> {log}"]
            "#,
            state = root.join(".rundag").display(),
            log = log.display(),
        ),
    )?;

    let mut args = args_for(&config_path);
    args.tasks = vec!["test".to_string()];

    let code = rundag::run(args).await?;
    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&log)?, "build\ntest\n");
    Ok(())
}
