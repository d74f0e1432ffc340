//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;
use std::fs::Metadata;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::storage::filesystem::content_type_for;

/// A file held by the store, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    /// Unix timestamp in seconds
    pub modified: u64,
    pub content_type: &'static str,
    #[serde(skip)]
    pub(crate) modified_at: SystemTime,
}

impl StoredFile {
    pub fn from_metadata(name: String, metadata: &Metadata) -> Self {
        let modified_at = metadata.modified().unwrap_or(UNIX_EPOCH);
        let modified = modified_at
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_secs())
            .unwrap_or(0);

        Self {
            content_type: content_type_for(&name),
            size: metadata.len(),
            modified,
            modified_at,
            name,
        }
    }
}

/// Result of resolving a download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub path: PathBuf,
    pub file: StoredFile,
}
