// src/state/mod.rs

//! Persisted run state: one fingerprint record per task, surviving across
//! invocations.
//!
//! Layout: `<state_dir>/<task>.toml`, one file per task name. Writes go to a
//! sibling temp file first and are then renamed into place, so an
//! interrupted process can never leave a half-written record that parses.
//! Unreadable or corrupt records degrade to "no record", which simply forces
//! the task to run again.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fresh::fingerprint::{FileSignature, signature_of};

/// Fingerprints of a task's file dependencies at its last successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Unix timestamp (seconds) of the last successful completion.
    pub updated_at: i64,
    /// File path -> signature at the time of that run.
    #[serde(default)]
    pub deps: BTreeMap<String, FileSignature>,
}

impl FingerprintRecord {
    /// A record with no file signatures (for tasks without file deps).
    pub fn empty() -> Self {
        Self {
            updated_at: unix_now(),
            deps: BTreeMap::new(),
        }
    }

    /// Fingerprint the given files right now.
    ///
    /// Fails if any file cannot be read; the caller decides whether that is
    /// fatal (it is not, for the runner: the record is simply not written).
    pub fn capture(paths: &[PathBuf]) -> Result<Self> {
        let mut deps = BTreeMap::new();
        for path in paths {
            let sig = signature_of(path)?;
            deps.insert(path.to_string_lossy().into_owned(), sig);
        }
        Ok(Self {
            updated_at: unix_now(),
            deps,
        })
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// On-disk store of [`FingerprintRecord`]s, keyed by task name.
///
/// Shared across workers: records for distinct task names live in distinct
/// files, so concurrent saves never conflict.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, task: &str) -> PathBuf {
        self.dir.join(format!("{task}.toml"))
    }

    /// Load the record for a task, or `None` if it has never completed
    /// successfully. Corruption degrades to `None` (logged, never an error),
    /// so a damaged store only costs a rerun.
    pub fn load(&self, task: &str) -> Option<FingerprintRecord> {
        let path = self.record_path(task);

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(task, ?path, %err, "unreadable state record; treating as absent");
                return None;
            }
        };

        match toml::from_str(&contents) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(task, ?path, %err, "corrupt state record; treating as absent");
                None
            }
        }
    }

    /// Persist the record for a task, replacing any prior one.
    ///
    /// Write-then-rename keeps the operation atomic with respect to process
    /// interruption.
    pub fn save(&self, task: &str, record: &FingerprintRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating state directory at {:?}", self.dir))?;

        let body = toml::to_string(record)
            .map_err(|e| anyhow::anyhow!("serializing state record for '{task}': {e}"))?;

        let path = self.record_path(task);
        let tmp = self.dir.join(format!("{task}.toml.tmp"));

        fs::write(&tmp, body).with_context(|| format!("writing state record to {:?}", tmp))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("moving state record into place at {:?}", path))?;

        debug!(task, ?path, "stored fingerprint record");
        Ok(())
    }
}
