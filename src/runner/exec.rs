// src/runner/exec.rs

//! Action execution: runs one task's actions in declared order, stopping at
//! the first failure. Shell actions go through `sh -c` (or `cmd /C` on
//! Windows) via `tokio::process`; structured callables run on the blocking
//! pool. Output is treated opaquely, logged at debug, and the tail of stderr
//! is folded into the failure reason.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::registry::{Action, Task};

/// Run every action of `task`. Returns `Err(reason)` for the first failing
/// action; remaining actions are not invoked.
pub async fn run_actions(task: &Task) -> Result<(), String> {
    for (idx, action) in task.actions.iter().enumerate() {
        match action {
            Action::Shell(cmd) => run_shell(task, idx, cmd).await?,
            Action::Fn(step) => run_step(task, idx, step.clone()).await?,
        }
    }
    Ok(())
}

async fn run_shell(task: &Task, idx: usize, cmd: &str) -> Result<(), String> {
    info!(task = %task.name, action = idx, cmd, "running shell action");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = command
        .output()
        .await
        .map_err(|e| format!("spawning action {idx} ('{cmd}'): {e}"))?;

    if !output.stdout.is_empty() {
        debug!(task = %task.name, action = idx, "stdout: {}", String::from_utf8_lossy(&output.stdout).trim_end());
    }
    if !output.stderr.is_empty() {
        debug!(task = %task.name, action = idx, "stderr: {}", String::from_utf8_lossy(&output.stderr).trim_end());
    }

    if output.status.success() {
        return Ok(());
    }

    let code = output.status.code().unwrap_or(-1);
    let stderr_tail = String::from_utf8_lossy(&output.stderr);
    let stderr_tail = stderr_tail.lines().last().unwrap_or("").trim();

    if stderr_tail.is_empty() {
        Err(format!("action {idx} ('{cmd}') exited with code {code}"))
    } else {
        Err(format!(
            "action {idx} ('{cmd}') exited with code {code}: {stderr_tail}"
        ))
    }
}

async fn run_step(
    task: &Task,
    idx: usize,
    step: crate::registry::StepFn,
) -> Result<(), String> {
    info!(task = %task.name, action = idx, "running structured action");

    let joined = tokio::task::spawn_blocking(move || step()).await;
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("action {idx} failed: {err}")),
        Err(join_err) => Err(format!("action {idx} panicked: {join_err}")),
    }
}
