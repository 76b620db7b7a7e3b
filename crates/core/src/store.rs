// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence backends for the offline queue.
//!
//! A store holds one namespaced key: the whole queue as a JSON array. Every
//! save replaces the complete snapshot, so a store never has to reconcile
//! partial writes.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fs2::FileExt;

use crate::error::{Error, Result};
use crate::item::QueueItem;

/// Durable storage for a queue snapshot.
pub trait QueueStore: Send {
    /// Loads the last saved snapshot. A store that was never written is empty.
    fn load(&self) -> Result<Vec<QueueItem>>;

    /// Replaces the stored snapshot.
    ///
    /// Either the whole snapshot is stored or the previous one is left intact.
    fn save(&mut self, items: &[QueueItem]) -> Result<()>;
}

/// Queue snapshot stored as `<dir>/<namespace>.json`.
///
/// Writes go to `<namespace>.json.tmp`, are fsynced, then renamed over the
/// target. The store holds an exclusive lock on `<namespace>.lock` for its
/// lifetime so two processes never own the same queue.
pub struct JsonFileStore {
    path: PathBuf,
    tmp_path: PathBuf,
    namespace: String,
    /// Held for the flock; released on drop.
    _lock: File,
}

impl JsonFileStore {
    /// Opens (without reading) the queue file for `namespace` under `dir`.
    pub fn open(dir: &Path, namespace: &str) -> Result<Self> {
        validate_namespace(namespace)?;
        fs::create_dir_all(dir)?;

        let lock_path = dir.join(format!("{namespace}.lock"));
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| Error::Locked(namespace.to_string()))?;

        Ok(JsonFileStore {
            path: dir.join(format!("{namespace}.json")),
            tmp_path: dir.join(format!("{namespace}.json.tmp")),
            namespace: namespace.to_string(),
            _lock: lock,
        })
    }

}

impl QueueStore for JsonFileStore {
    fn load(&self) -> Result<Vec<QueueItem>> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Corrupted(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&mut self, items: &[QueueItem]) -> Result<()> {
        let json = serde_json::to_vec(items)?;

        let mut file = File::create(&self.tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.tmp_path, &self.path)?;

        // Persist the rename itself; the data is already safe in the file
        if let Err(e) = sync_parent(&self.path) {
            tracing::warn!(namespace = %self.namespace, error = %e, "could not sync queue directory");
        }

        Ok(())
    }
}

/// Fsyncs the directory holding `path`.
fn sync_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) => File::open(dir)?.sync_all(),
        None => Ok(()),
    }
}

fn validate_namespace(namespace: &str) -> Result<()> {
    let valid = !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "invalid queue namespace: '{namespace}'\n  hint: use letters, digits, '-' or '_'"
        )))
    }
}

/// In-process store.
///
/// Clones share the same snapshot, which lets a test drop a queue and
/// reopen it over the same data to simulate a restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<Vec<QueueItem>>>,
    fail_writes: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of the stored snapshot.
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl QueueStore for MemoryStore {
    fn load(&self) -> Result<Vec<QueueItem>> {
        Ok(self.snapshot())
    }

    fn save(&mut self, items: &[QueueItem]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("simulated write failure")));
        }
        *self.items.lock().unwrap_or_else(|e| e.into_inner()) = items.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
