//! Local filesystem backend.
//!
//! Keys map to paths below a root directory (`<root>/<key>`). Dumps are
//! aged by the timestamp in their file name; file modification times are
//! never consulted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dumpster_core::naming::{validate_key, DUMP_DIR};
use dumpster_core::retention::{classify_key, KeyVerdict};
use dumpster_core::types::Timestamp;

use crate::error::StorageError;
use crate::metrics::StorageMetrics;
use crate::Storage;

const BACKEND: &str = "local";

/// Storage backend rooted at a local directory.
pub struct LocalStorage {
    root: PathBuf,
    metrics: Arc<StorageMetrics>,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, metrics: Arc<StorageMetrics>) -> Self {
        Self {
            root: root.into(),
            metrics,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the `dumps/` namespace.
    pub fn dump_dir(&self) -> PathBuf {
        self.root.join(DUMP_DIR)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "save");
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        // The final name only ever holds a complete file.
        let staging = staging_path(&path);
        let size = bytes.len();
        let written = match tokio::fs::write(&staging, bytes).await {
            Ok(()) => tokio::fs::rename(&staging, &path)
                .await
                .map_err(|e| StorageError::io(&path, e)),
            Err(e) => Err(StorageError::io(&staging, e)),
        };

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %staging.display(), error = %cleanup, "Failed to remove staging file");
                }
            }
            return Err(e);
        }

        tracing::debug!(path = %path.display(), bytes = size, "Saved object");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "load");
        let path = self.path_for(key)?;

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::not_found(key),
            _ => StorageError::io(&path, e),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "delete");
        let path = self.path_for(key)?;

        tokio::fs::remove_file(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::not_found(key),
            _ => StorageError::io(&path, e),
        })?;

        tracing::debug!(path = %path.display(), "Deleted object");
        Ok(())
    }

    async fn purge(&self, cutoff: Timestamp) -> Result<usize, StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "purge");
        purge_dir(&self.dump_dir(), cutoff).await
    }
}

/// Hidden sibling of `path` used while a save is in flight.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

// ---------------------------------------------------------------------------
// Directory purge
// ---------------------------------------------------------------------------

/// Recursively delete dump files under `dir` whose file-name timestamp is
/// strictly before `cutoff`.
///
/// A missing `dir` counts as an empty one. Files that are not dumps, or whose
/// names do not parse as timestamps, are left in place.
pub async fn purge_dir(dir: &Path, cutoff: Timestamp) -> Result<usize, StorageError> {
    let exists = tokio::fs::try_exists(dir)
        .await
        .map_err(|e| StorageError::io(dir, e))?;
    if !exists {
        tracing::debug!(dir = %dir.display(), "Dump directory does not exist, nothing to purge");
        return Ok(0);
    }

    let mut removed = 0;
    for path in list_files(dir).await? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        match classify_key(name, cutoff) {
            KeyVerdict::Retained(_) => {}
            KeyVerdict::NotDump => {
                tracing::warn!(path = %path.display(), "Skipping non-dump file");
            }
            KeyVerdict::Unparsable => {
                tracing::warn!(path = %path.display(), "Skipping dump with unparsable timestamp");
            }
            KeyVerdict::Expired(created_at) => {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| StorageError::io(&path, e))?;
                tracing::info!(
                    path = %path.display(),
                    created_at = %created_at,
                    "Purged expired dump"
                );
                removed += 1;
            }
        }
    }

    Ok(removed)
}

/// Every regular file below `dir`, sorted by path.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut pending = vec![dir.to_path_buf()];
    let mut files = Vec::new();

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .map_err(|e| StorageError::io(&current, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&current, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(&path, e))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
