//! Per-process TTL read cache for GET responses.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    payload: serde_json::Value,
    expires_at: Instant,
}

/// Read-through cache keyed by normalized `file_id`.
///
/// Entries expire `ttl` after insertion and are removed on the first read
/// past their expiry. There is no cross-process coherence: a second
/// gateway instance would run its own independent cache.
pub struct ReadCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, file_id: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock();
        match entries.get(file_id) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(file_id);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, file_id: &str, payload: serde_json::Value) {
        self.entries.lock().insert(
            file_id.to_string(),
            CacheEntry {
                payload,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop the entry for `file_id` unconditionally. Called on every
    /// write path so no value stays cached past a write to its key.
    pub fn invalidate(&self, file_id: &str) {
        self.entries.lock().remove(file_id);
    }
}
