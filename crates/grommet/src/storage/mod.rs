//! Storage abstraction layer for issues.
//!
//! This module provides the core storage trait for issue records. The only
//! backend is the in-memory one: all data lives in the process and is lost
//! when it exits.
//!
//! # Architecture
//!
//! The storage layer uses an async trait so callers do not depend on whether
//! a backend blocks. The trait is object-safe, allowing for dynamic dispatch
//! via `Box<dyn IssueStorage>`; services that share one store hold a
//! [`SharedStorage`] handle.
//!
//! # Example
//!
//! ```no_run
//! use grommet::storage::{IssueStorage, in_memory::new_in_memory_storage};
//! use grommet::domain::{IssueStatus, NewIssue, Priority};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut storage = new_in_memory_storage("issue".to_string());
//!
//!     let issue = storage
//!         .create(NewIssue {
//!             title: "Login page not responsive on mobile".to_string(),
//!             description: "Buttons overflow on small screens".to_string(),
//!             status: IssueStatus::Open,
//!             priority: Priority::High,
//!         })
//!         .await?;
//!     println!("Created issue: {}", issue.id);
//!
//!     Ok(())
//! }
//! ```

use crate::domain::{FileId, FileMetadata, Issue, IssueFilter, IssueId, IssueUpdate, NewIssue};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

// Storage backend implementations
pub mod in_memory;

/// A storage instance shared between services.
pub type SharedStorage = Arc<RwLock<Box<dyn IssueStorage>>>;

/// Wrap a storage backend for sharing.
pub fn into_shared(storage: Box<dyn IssueStorage>) -> SharedStorage {
    Arc::new(RwLock::new(storage))
}

/// Core storage trait for issue management.
///
/// # Method Categories
///
/// - **CRUD**: `create`, `get`, `update`, `delete`
/// - **Attachments**: `add_attachment`, `remove_attachment`
/// - **Queries**: `list`
/// - **Batch Operations**: `import_issues`
///
/// # Absence
///
/// Unknown IDs are not errors: `get` and `update` return `None`, `delete`
/// and the attachment operations return `false`. Errors are reserved for
/// invalid input and backend failures.
#[async_trait]
pub trait IssueStorage: Send + Sync {
    // ========== CRUD Operations ==========

    /// Create a new issue.
    ///
    /// Generates a unique ID, sets both timestamps to the store clock and
    /// starts with no attachments.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the title is empty or too long.
    async fn create(&mut self, issue: NewIssue) -> Result<Issue>;

    /// Get an issue by ID.
    ///
    /// Returns `None` if the issue doesn't exist.
    async fn get(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Update an existing issue.
    ///
    /// Only fields present in `updates` are modified; `updated_at` is always
    /// moved to the store clock. Returns `None` if the issue doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a new title is invalid.
    async fn update(&mut self, id: &IssueId, updates: IssueUpdate) -> Result<Option<Issue>>;

    /// Delete an issue. Returns whether it existed.
    async fn delete(&mut self, id: &IssueId) -> Result<bool>;

    // ========== Attachments ==========

    /// Append an attachment to an issue and bump its `updated_at`.
    ///
    /// Returns `false` if the issue doesn't exist.
    async fn add_attachment(&mut self, id: &IssueId, attachment: FileMetadata) -> Result<bool>;

    /// Remove an attachment from an issue and bump its `updated_at`.
    ///
    /// Returns `false` if the issue or the attachment doesn't exist.
    async fn remove_attachment(&mut self, id: &IssueId, file_id: &FileId) -> Result<bool>;

    // ========== Queries ==========

    /// List issues matching the given filter.
    ///
    /// Results are ordered by `updated_at` descending, then by ID ascending
    /// so that equal timestamps still sort deterministically.
    async fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    // ========== Batch Operations ==========

    /// Import complete issue records, keeping their IDs and timestamps.
    ///
    /// Records with an ID that already exists replace the stored record.
    async fn import_issues(&mut self, issues: Vec<Issue>) -> Result<()>;
}
