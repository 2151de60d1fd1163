//! Shared fixtures for storage integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dumpster_core::types::Timestamp;
use dumpster_storage::{LocalStorage, Storage, StorageError, StorageMetrics};

pub fn utc(y: i32, mo: u32, d: u32, h: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

pub fn local(root: &Path) -> LocalStorage {
    LocalStorage::new(root, Arc::new(StorageMetrics::new().unwrap()))
}

/// Write each key under `root` with a small marker payload.
pub fn seed(root: &Path, keys: &[&str]) {
    for key in keys {
        let path = root.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("-- {key}\n")).unwrap();
    }
}

/// Sorted `(relative path, contents)` for every file below `root`.
pub fn tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                files.push((relative, std::fs::read(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}

/// In-memory log sink that only keeps WARN and above.
#[derive(Clone, Default)]
pub struct WarnLog(Arc<Mutex<Vec<u8>>>);

impl WarnLog {
    /// Route events on the current thread here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for WarnLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Backend that records purge cutoffs and reports a fixed count.
#[derive(Default)]
pub struct RecordingStorage {
    pub removed: usize,
    pub cutoffs: Mutex<Vec<Timestamp>>,
}

impl RecordingStorage {
    pub fn cutoffs(&self) -> Vec<Timestamp> {
        self.cutoffs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn save(&self, _key: &str, _bytes: Vec<u8>) -> Result<(), StorageError> {
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound {
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        Err(StorageError::NotFound {
            key: key.to_string(),
        })
    }

    async fn purge(&self, cutoff: Timestamp) -> Result<usize, StorageError> {
        self.cutoffs.lock().unwrap().push(cutoff);
        Ok(self.removed)
    }
}
