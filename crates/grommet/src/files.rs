//! File metadata registry.
//!
//! Keeps the descriptive record of every uploaded file, keyed by file ID.
//! The registry performs no validation beyond presence checks: keeping it
//! consistent with the attachment lists embedded in issues is the caller's
//! job (see [`crate::app::App`]).

use crate::domain::{FileId, FileMetadata, IssueId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Cloneable handle to the shared metadata map.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: Arc<Mutex<HashMap<FileId, FileMetadata>>>,
}

impl FileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `metadata.id`
    pub async fn put(&self, metadata: FileMetadata) {
        debug!(file_id = %metadata.id, issue_id = %metadata.issue_id, "Registered file metadata");
        self.files.lock().await.insert(metadata.id.clone(), metadata);
    }

    /// Look up a record
    pub async fn get(&self, id: &FileId) -> Option<FileMetadata> {
        self.files.lock().await.get(id).cloned()
    }

    /// All records owned by an issue, oldest upload first
    pub async fn list_by_issue(&self, issue_id: &IssueId) -> Vec<FileMetadata> {
        let files = self.files.lock().await;
        let mut owned: Vec<FileMetadata> = files
            .values()
            .filter(|file| &file.issue_id == issue_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
        owned
    }

    /// Remove a record. Returns whether it existed.
    pub async fn delete(&self, id: &FileId) -> bool {
        self.files.lock().await.remove(id).is_some()
    }

    /// Remove every record owned by an issue, returning the removed records
    pub async fn delete_by_issue(&self, issue_id: &IssueId) -> Vec<FileMetadata> {
        let mut files = self.files.lock().await;
        let ids: Vec<FileId> = files
            .values()
            .filter(|file| &file.issue_id == issue_id)
            .map(|file| file.id.clone())
            .collect();
        ids.iter().filter_map(|id| files.remove(id)).collect()
    }

    /// Number of registered files
    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }

    /// Whether no files are registered
    pub async fn is_empty(&self) -> bool {
        self.files.lock().await.is_empty()
    }
}
