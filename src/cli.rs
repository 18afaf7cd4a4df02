// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `rundag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rundag",
    version,
    about = "Run declared tasks incrementally, skipping anything already up to date.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, with their transitive dependencies.
    ///
    /// Default: `[config].default_tasks`, or every declared task when the
    /// config does not set any.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Rundag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Rundag.toml")]
    pub config: String,

    /// Number of tasks allowed to run concurrently.
    ///
    /// Overrides `[config].jobs`. With 1 (the default), independent tasks
    /// execute strictly in declaration order.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Stop dispatching new tasks after the first failure.
    ///
    /// Tasks already in flight are allowed to finish. Without this flag the
    /// run continues and reports every failure at the end.
    #[arg(long)]
    pub fail_fast: bool,

    /// List declared tasks with their dependencies and exit.
    #[arg(long)]
    pub list: bool,

    /// Build and print the execution plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
