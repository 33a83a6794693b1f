//! Domain types for issue tracking.
//!
//! This module contains the core domain types for the grommet issue tracker:
//! issues, the metadata of their file attachments, and the transient records
//! exchanged during an upload.

use crate::error::ValidationError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Unique identifier for an issue
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for an uploaded file.
///
/// The same value names the object in the object store and the metadata
/// record in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    /// Create a new file ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Represents an issue in the tracking system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier for the issue
    pub id: IssueId,

    /// Issue title
    pub title: String,

    /// Issue description
    pub description: String,

    /// Current status
    pub status: IssueStatus,

    /// Priority level
    pub priority: Priority,

    /// Creation timestamp, never changed after creation
    pub created_at: DateTime<Utc>,

    /// Last update timestamp, bumped by every mutation
    pub updated_at: DateTime<Utc>,

    /// Attached files in attach order
    pub attachments: Vec<FileMetadata>,
}

/// Status of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    /// Issue is open and ready to work on
    Open,

    /// Issue is currently being worked on
    InProgress,

    /// Issue has been completed
    Closed,
}

impl IssueStatus {
    /// All statuses in display order
    pub const ALL: [IssueStatus; 3] = [Self::Open, Self::InProgress, Self::Closed];
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Priority of an issue, ordered from least to most pressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait
    Low,

    /// Normal priority
    Medium,

    /// Should be picked up soon
    High,

    /// Needs attention now
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

/// Data for creating a new issue
#[derive(Debug, Clone)]
pub struct NewIssue {
    /// Issue title
    pub title: String,

    /// Issue description
    pub description: String,

    /// Initial status
    pub status: IssueStatus,

    /// Priority level
    pub priority: Priority,
}

impl NewIssue {
    /// Validate the issue data before it is stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// Check that a title is non-empty and within [`MAX_TITLE_LENGTH`].
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let length = title.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            length,
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(())
}

/// Data for updating an existing issue.
///
/// Only fields set to `Some` are applied. Timestamps and attachments are not
/// part of an update; the store maintains them.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    /// New title (if updating)
    pub title: Option<String>,

    /// New description (if updating)
    pub description: Option<String>,

    /// New status (if updating)
    pub status: Option<IssueStatus>,

    /// New priority (if updating)
    pub priority: Option<Priority>,
}

impl IssueUpdate {
    /// Whether the update changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }
}

/// Filter for querying issues
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    /// Filter by status
    pub status: Option<IssueStatus>,

    /// Filter by priority
    pub priority: Option<Priority>,

    /// Case-insensitive substring matched against title or description
    pub search: Option<String>,

    /// Limit number of results
    pub limit: Option<usize>,
}

impl IssueFilter {
    /// Whether an issue passes the status, priority and search criteria.
    ///
    /// `limit` is applied by the caller after sorting.
    pub fn matches(&self, issue: &Issue) -> bool {
        if self.status.is_some_and(|s| s != issue.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != issue.priority) {
            return false;
        }
        match &self.search {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                issue.title.to_lowercase().contains(&query)
                    || issue.description.to_lowercase().contains(&query)
            }
            _ => true,
        }
    }
}

/// Issue totals per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// All issues
    pub total: usize,
    /// Open issues
    pub open: usize,
    /// Issues in progress
    pub in_progress: usize,
    /// Closed issues
    pub closed: usize,
}

impl StatusCounts {
    /// Count issues by status in a single pass
    pub fn tally<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        issues
            .into_iter()
            .fold(Self::default(), |mut counts, issue| {
                counts.total += 1;
                match issue.status {
                    IssueStatus::Open => counts.open += 1,
                    IssueStatus::InProgress => counts.in_progress += 1,
                    IssueStatus::Closed => counts.closed += 1,
                }
                counts
            })
    }
}

/// Descriptive record of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Storage identifier
    pub id: FileId,

    /// Stored object name (same as the identifier)
    pub filename: String,

    /// File name supplied by the client
    pub original_name: String,

    /// Size in bytes
    pub size: u64,

    /// MIME type supplied by the client
    pub content_type: String,

    /// When the upload completed
    pub uploaded_at: DateTime<Utc>,

    /// Retrieval URL in the object store
    pub url: String,

    /// Issue the file was uploaded to
    pub issue_id: IssueId,
}

/// Upload target handed out by the object store.
///
/// Ephemeral: only lives for the upload that requested it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    /// URL the bytes must be sent to
    pub upload_url: String,

    /// Identifier the object will be stored under
    pub file_id: FileId,

    /// When the URL stops being valid
    pub expires_at: DateTime<Utc>,
}

/// State of a single file within an upload batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Transfer in flight
    Uploading,

    /// Stored and registered
    Completed,

    /// Failed; see the event's error text
    Error,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uploading => write!(f, "uploading"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Progress event for one file of an upload batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    /// Storage id, absent when the file failed before one was issued
    pub file_id: Option<FileId>,

    /// Original client-side file name
    pub file_name: String,

    /// Percentage in `0.0..=100.0`
    pub progress: f64,

    /// Current state
    pub status: UploadStatus,

    /// Failure text when `status` is [`UploadStatus::Error`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadProgress {
    /// An in-flight event
    pub fn uploading(file_id: FileId, file_name: &str, progress: f64) -> Self {
        Self {
            file_id: Some(file_id),
            file_name: file_name.to_string(),
            progress,
            status: UploadStatus::Uploading,
            error: None,
        }
    }

    /// The terminal success event
    pub fn completed(file_id: FileId, file_name: &str) -> Self {
        Self {
            file_id: Some(file_id),
            file_name: file_name.to_string(),
            progress: 100.0,
            status: UploadStatus::Completed,
            error: None,
        }
    }

    /// The terminal failure event
    pub fn failed(file_id: Option<FileId>, file_name: &str, error: String) -> Self {
        Self {
            file_id,
            file_name: file_name.to_string(),
            progress: 0.0,
            status: UploadStatus::Error,
            error: Some(error),
        }
    }

    /// Whether no further events will follow for this file
    pub fn is_terminal(&self) -> bool {
        self.status != UploadStatus::Uploading
    }
}

/// A file submitted by the client for upload
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Client-side file name
    pub name: String,

    /// Declared MIME type
    pub content_type: String,

    /// File contents
    pub data: Bytes,
}

impl CandidateFile {
    /// Create a candidate file
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
