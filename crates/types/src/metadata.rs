//! The authoritative metadata record for a single file path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Versioned metadata for one file, owned by exactly one metadata node.
///
/// `created_at` is set on the first write and never changes afterwards;
/// `version` and `updated_at` advance on every subsequent write, while
/// `owner` and `size` are replaced wholesale (no partial update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_id: String,
    pub owner: String,
    pub size: u64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileMetadata {
    /// Build the version-1 record for a path that has never been written.
    pub fn first_write(file_id: String, owner: String, size: u64, now: DateTime<Utc>) -> Self {
        Self {
            file_id,
            owner,
            size,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the successor record for an existing entry, preserving
    /// `created_at` and bumping the version.
    pub fn next_write(&self, owner: String, size: u64, now: DateTime<Utc>) -> Self {
        Self {
            file_id: self.file_id.clone(),
            owner,
            size,
            version: self.version + 1,
            created_at: self.created_at,
            updated_at: now,
        }
    }
}
