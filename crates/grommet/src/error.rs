//! Error types for grommet operations.

use crate::domain::{FileId, FileMetadata, IssueId};
use std::io;
use thiserror::Error;

/// The error type for grommet operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was rejected before any state changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Issue not found.
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    /// File not found in the metadata registry or object store.
    #[error("File not found: {0}")]
    FileNotFound(FileId),

    /// The simulated object store failed to accept an upload.
    #[error("Transfer of {file_id} failed: {reason}")]
    Transfer {
        /// The storage id the transfer targeted
        file_id: FileId,
        /// Human-readable failure reason
        reason: String,
    },

    /// An upload URL that does not point into the object store.
    #[error("Invalid upload URL: {0}")]
    InvalidUploadUrl(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Reasons an issue or a candidate file fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Titles must contain at least one non-whitespace character.
    #[error("Title cannot be empty")]
    EmptyTitle,

    /// Title exceeds the maximum length.
    #[error("Title is {length} characters, maximum is {max}")]
    TitleTooLong {
        /// Length of the rejected title, in characters
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// The file's content type is not on the allow-list.
    #[error("Invalid file type: {file_name} ({content_type})")]
    UnsupportedContentType {
        /// Client-supplied file name
        file_name: String,
        /// Rejected content type
        content_type: String,
    },

    /// The file is larger than the upload limit.
    #[error("File too large: {file_name} ({size} bytes, max {max} bytes)")]
    FileTooLarge {
        /// Client-supplied file name
        file_name: String,
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },
}

/// Failure of an upload batch.
///
/// Files that finished before the failure stay registered and attached;
/// they are reported in `completed`.
#[derive(Debug, Error)]
#[error("Upload {}failed: {source}", subject(file_name.as_deref()))]
pub struct BatchError {
    /// Metadata of files that completed before the failure, in batch order
    pub completed: Vec<FileMetadata>,
    /// Original name of the file that failed, if a file was being processed
    pub file_name: Option<String>,
    /// The underlying failure
    #[source]
    pub source: Error,
}

impl BatchError {
    /// Build a batch error for a failure that happened before any file was
    /// attempted (e.g. the target issue is missing).
    pub fn before_start(source: Error) -> Self {
        Self {
            completed: Vec::new(),
            file_name: None,
            source,
        }
    }
}

fn subject(file_name: Option<&str>) -> String {
    file_name
        .map(|name| format!("of {name} "))
        .unwrap_or_default()
}

/// A specialized Result type for grommet operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_batch_error_names_failed_file() {
        let err = BatchError {
            completed: Vec::new(),
            file_name: Some("huge.png".to_string()),
            source: Error::IssueNotFound(IssueId::new("issue_1")),
        };

        assert_eq!(
            err.to_string(),
            "Upload of huge.png failed: Issue not found: issue_1"
        );
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("Issue not found: issue_1")
        );
    }

    #[test]
    fn test_batch_error_before_start() {
        let err = BatchError::before_start(Error::Storage("lock poisoned".to_string()));

        assert_eq!(err.to_string(), "Upload failed: Storage error: lock poisoned");
        assert!(err.source().is_some());
    }
}
