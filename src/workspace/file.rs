//! Processed-file persistence for cached correction workspaces.
//!
//! Stand-in for the framework's processed-file save/load algorithms: a cache
//! file holds one or two named workspaces (a lone sample correction, or a
//! sample/container group) behind a small header. Writes go to a temp file
//! in the destination directory and are renamed into place, so readers only
//! ever observe a complete file.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::workspace::MatrixWorkspace;

/// A workspace entry as stored on disk, keeping the name it held in the
/// registry when persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedWorkspace {
    pub name: String,
    pub workspace: MatrixWorkspace,
}

/// On-disk representation of a persisted correction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// Cache signature the entries were computed under.
    pub signature: String,
    /// RFC 3339 timestamp of when the entries were persisted.
    pub created_at: String,
    /// One entry for a lone sample correction, two for a sample/container
    /// group.
    pub entries: Vec<NamedWorkspace>,
}

impl CacheFile {
    pub fn new(signature: &str, entries: Vec<NamedWorkspace>) -> Self {
        Self {
            signature: signature.to_string(),
            created_at: Utc::now().to_rfc3339(),
            entries,
        }
    }
}

/// Write a cache file atomically (temp file in the same directory, then
/// rename into place).
pub fn write_cache_file(path: &Path, file: &CacheFile) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let temp_path = dir.join(format!(".tmp.{}.nxs", process::id()));
    let payload = serde_json::to_vec(file)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut temp = File::create(&temp_path)?;
    if let Err(e) = temp.write_all(&payload).and_then(|_| temp.flush()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    drop(temp);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

/// Read a cache file. The caller is expected to have checked existence;
/// a file that exists but cannot be decoded is `Malformed`, not a miss.
pub fn read_cache_file(path: &Path) -> Result<CacheFile> {
    let payload = fs::read_to_string(path)?;
    serde_json::from_str(&payload).map_err(|e| Error::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
