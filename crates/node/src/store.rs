//! Versioned in-memory metadata store with two-tier locking.

use chrono::Utc;
use metadfs_types::{normalize_path, FileMetadata};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-shard metadata map.
///
/// Lock discipline: the per-path lock is acquired first and held across
/// the whole read-modify-write of a mutation; the store lock is acquired
/// inside it and only for the map operation itself, never across an
/// await. Plain reads take only the store lock.
pub struct MetadataStore {
    records: Mutex<HashMap<String, FileMetadata>>,
    path_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            path_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lazily create the write lock for a path. Locks are never removed;
    /// one exists per distinct path ever written.
    fn path_lock(&self, file_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.path_locks.lock();
        locks
            .entry(file_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Create or update the record for a path, returning the new version.
    pub async fn put(&self, file_id: &str, owner: String, size: u64) -> u64 {
        let file_id = normalize_path(file_id);
        let lock = self.path_lock(&file_id);
        let _guard = lock.lock().await;

        let now = Utc::now();
        let mut records = self.records.lock();
        let meta = match records.get(&file_id) {
            None => FileMetadata::first_write(file_id.clone(), owner, size, now),
            Some(existing) => existing.next_write(owner, size, now),
        };
        let version = meta.version;
        records.insert(file_id, meta);
        version
    }

    pub fn get(&self, file_id: &str) -> Option<FileMetadata> {
        let file_id = normalize_path(file_id);
        self.records.lock().get(&file_id).cloned()
    }

    /// Remove the record for a path. Returns false if it was absent.
    pub async fn delete(&self, file_id: &str) -> bool {
        let file_id = normalize_path(file_id);
        let lock = self.path_lock(&file_id);
        let _guard = lock.lock().await;

        self.records.lock().remove(&file_id).is_some()
    }

    /// All records whose key starts with the normalized prefix. Plain
    /// string prefix match, not path-segment aware.
    pub fn list(&self, prefix: &str) -> Vec<FileMetadata> {
        let prefix = normalize_path(prefix);
        self.records
            .lock()
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, meta)| meta.clone())
            .collect()
    }

    /// Snapshot of stored keys, taken under the store lock.
    pub fn keys(&self) -> Vec<String> {
        self.records.lock().keys().cloned().collect()
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}
