// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Configuration-shaped errors (bad descriptors, unknown references, cycles)
//! abort before any task runs and map to exit code 2; everything else maps
//! to exit code 1 so callers can tell "your config is wrong" apart from
//! "a task failed".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RundagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("task '{task}' has unknown dependency '{dep}'")]
    UnknownTask { task: String, dep: String },

    #[error("unknown task '{0}' requested")]
    UnknownRequest(String),

    #[error("cycle detected in task graph: {}", cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RundagError {
    /// Process exit code for this error: 2 for configuration problems that
    /// abort before execution, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            RundagError::Config(_)
            | RundagError::UnknownTask { .. }
            | RundagError::UnknownRequest(_)
            | RundagError::Cycle { .. }
            | RundagError::Toml(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RundagError>;
