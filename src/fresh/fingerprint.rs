// src/fresh/fingerprint.rs

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Content-based signature of a single file.
///
/// The hash alone decides equality; mtime and length ride along so the store
/// can report *what* changed and when a file was last seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSignature {
    /// Hex-encoded blake3 hash of the file contents.
    pub hash: String,
    /// Modification time in nanoseconds since the Unix epoch.
    pub mtime_ns: i64,
    /// File length in bytes.
    pub len: u64,
}

/// Compute the signature of a file.
pub fn signature_of(path: impl AsRef<Path>) -> Result<FileSignature> {
    let path = path.as_ref();

    let meta = std::fs::metadata(path)
        .with_context(|| format!("reading metadata of {:?}", path))?;
    let mtime_ns = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);

    let hash = hash_file(path)?;
    debug!(?path, hash = %hash, "fingerprinted file");

    Ok(FileSignature {
        hash,
        mtime_ns,
        len: meta.len(),
    })
}

/// Hex blake3 hash of a file's contents, streamed in 8 KiB chunks.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;

    let mut hasher = Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
