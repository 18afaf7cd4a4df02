// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::{Result, RundagError};

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (dependency references, etc.). Use [`load_and_validate`] for that.
/// A missing or unreadable file is a configuration error, like malformed TOML.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| RundagError::Config(format!("cannot read config file {path:?}: {e}")))?;

    let config: ConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run semantic validation.
///
/// This is the recommended entry point for the rest of the application:
/// reads TOML, applies defaults, and checks for duplicate task names,
/// unknown `deps` references, self-dependencies, cycles, and global config
/// sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a configuration directly from a TOML string.
///
/// Useful for tests and for embedding task descriptors programmatically.
pub fn load_from_str(contents: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(contents).map_err(RundagError::Toml)?;
    validate_config(&config)?;
    Ok(config)
}
