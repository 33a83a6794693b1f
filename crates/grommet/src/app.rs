//! Application context shared by every front end.
//!
//! [`App`] wires the issue store, file registry, object store and uploader
//! together once and exposes the tracker's operations. Each service is
//! constructed here and handed to the others as a shared handle.
//!
//! # Example
//!
//! ```no_run
//! use grommet::app::App;
//! use grommet::config::GrommetConfig;
//! use grommet::domain::IssueFilter;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::with_sample_data(GrommetConfig::default()).await?;
//!     for issue in app.list_issues(&IssueFilter::default()).await? {
//!         println!("{} {}", issue.id, issue.title);
//!     }
//!     Ok(())
//! }
//! ```

use crate::config::GrommetConfig;
use crate::domain::{
    CandidateFile, FileId, FileMetadata, Issue, IssueFilter, IssueId, IssueStatus, IssueUpdate,
    NewIssue, Priority, StatusCounts, UploadProgress,
};
use crate::error::{BatchError, Error, Result};
use crate::files::FileRegistry;
use crate::id_generation::IdGenerator;
use crate::object_store::{ObjectStore, SimulatedObjectStore};
use crate::storage::{SharedStorage, in_memory::new_in_memory_storage, into_shared};
use crate::upload::Uploader;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Application context for issue and attachment operations.
pub struct App {
    config: GrommetConfig,
    storage: SharedStorage,
    registry: FileRegistry,
    object_store: Arc<dyn ObjectStore>,
    uploader: Uploader,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("issue_prefix", &self.config.issue_prefix)
            .field("storage", &"<dyn IssueStorage>")
            .field("object_store", &"<dyn ObjectStore>")
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create an empty tracker from configuration.
    pub fn new(config: GrommetConfig) -> Self {
        let storage = into_shared(new_in_memory_storage(config.issue_prefix.clone()));
        let registry = FileRegistry::new();
        let object_store: Arc<dyn ObjectStore> = Arc::new(SimulatedObjectStore::new(
            config.storage.clone(),
            config.file_prefix.clone(),
        ));
        let uploader = Uploader::new(
            Arc::clone(&storage),
            registry.clone(),
            Arc::clone(&object_store),
            config.upload.policy(),
            config.upload.progress_clear_delay(),
        );

        Self {
            config,
            storage,
            registry,
            object_store,
            uploader,
        }
    }

    /// Create a tracker seeded with the sample issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample issues cannot be imported.
    pub async fn with_sample_data(config: GrommetConfig) -> Result<Self> {
        let app = Self::new(config);
        let issues = sample_issues(&app.config.issue_prefix)?;
        info!(count = issues.len(), "Loading sample issues");
        app.storage.write().await.import_issues(issues).await?;
        Ok(app)
    }

    /// Create a tracker, seeding sample issues when the configuration asks for it.
    pub async fn from_config(config: GrommetConfig) -> Result<Self> {
        if config.sample_data {
            Self::with_sample_data(config).await
        } else {
            Ok(Self::new(config))
        }
    }

    /// The configuration the app was built from
    pub fn config(&self) -> &GrommetConfig {
        &self.config
    }

    /// Shared handle to the issue store
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Handle to the file registry
    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// Handle to the object store
    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.object_store
    }

    // ========== Issues ==========

    /// Create an issue.
    pub async fn create_issue(&self, new_issue: NewIssue) -> Result<Issue> {
        let issue = self.storage.write().await.create(new_issue).await?;
        info!(issue_id = %issue.id, "Created issue");
        Ok(issue)
    }

    /// Look up an issue.
    pub async fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>> {
        self.storage.read().await.get(id).await
    }

    /// Issues matching a filter, most recently updated first.
    pub async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.storage.read().await.list(filter).await
    }

    /// Apply a partial update. Returns `None` for an unknown issue.
    pub async fn update_issue(&self, id: &IssueId, updates: IssueUpdate) -> Result<Option<Issue>> {
        self.storage.write().await.update(id, updates).await
    }

    /// Delete an issue together with its files.
    ///
    /// Returns whether the issue existed.
    pub async fn delete_issue(&self, id: &IssueId) -> Result<bool> {
        if !self.storage.write().await.delete(id).await? {
            return Ok(false);
        }

        let files = self.registry.delete_by_issue(id).await;
        for file in &files {
            self.object_store.delete(&file.id).await?;
        }
        info!(issue_id = %id, files = files.len(), "Deleted issue");
        Ok(true)
    }

    /// Totals per status across all issues.
    pub async fn status_counts(&self) -> Result<StatusCounts> {
        let issues = self.list_issues(&IssueFilter::default()).await?;
        Ok(StatusCounts::tally(&issues))
    }

    // ========== Attachments ==========

    /// Upload files to an issue.
    ///
    /// See [`Uploader::upload_batch`].
    pub async fn upload_files(
        &self,
        issue_id: &IssueId,
        files: Vec<CandidateFile>,
        events: Option<UnboundedSender<UploadProgress>>,
    ) -> std::result::Result<Vec<FileMetadata>, BatchError> {
        self.uploader.upload_batch(issue_id, files, events).await
    }

    /// Fetch the bytes of an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` for an unknown or deleted file.
    pub async fn download_file(&self, file_id: &FileId) -> Result<Bytes> {
        if self.registry.get(file_id).await.is_none() {
            return Err(Error::FileNotFound(file_id.clone()));
        }
        let data = self.object_store.retrieve(file_id).await?;
        debug!(file_id = %file_id, size = data.len(), "Downloaded file");
        Ok(data)
    }

    /// Remove an attachment from an issue, dropping its record and bytes.
    ///
    /// Returns `false` if the issue does not carry the attachment.
    pub async fn delete_attachment(&self, issue_id: &IssueId, file_id: &FileId) -> Result<bool> {
        let removed = self
            .storage
            .write()
            .await
            .remove_attachment(issue_id, file_id)
            .await?;
        if !removed {
            return Ok(false);
        }

        self.registry.delete(file_id).await;
        self.object_store.delete(file_id).await?;
        info!(issue_id = %issue_id, file_id = %file_id, "Deleted attachment");
        Ok(true)
    }

    /// Registered files of an issue, oldest upload first.
    pub async fn files_for_issue(&self, issue_id: &IssueId) -> Vec<FileMetadata> {
        self.registry.list_by_issue(issue_id).await
    }

    // ========== Progress ==========

    /// Latest progress of the current or most recent batch.
    pub fn upload_progress(&self) -> Vec<UploadProgress> {
        self.uploader.tracker().snapshot()
    }

    /// Whether a batch is in flight.
    pub fn is_uploading(&self) -> bool {
        self.uploader.tracker().is_uploading()
    }
}

/// The issues a fresh tracker is seeded with.
fn sample_issues(prefix: &str) -> Result<Vec<Issue>> {
    let mut ids = IdGenerator::new(prefix);
    let samples = [
        (
            "Login page not responsive on mobile",
            "The login form overflows on small screens and buttons are not properly aligned.",
            IssueStatus::Open,
            Priority::High,
            (2024, 1, 15),
            (2024, 1, 15),
        ),
        (
            "API timeout on user profile fetch",
            "Users are experiencing timeouts when loading their profile page during peak hours.",
            IssueStatus::InProgress,
            Priority::Urgent,
            (2024, 1, 14),
            (2024, 1, 16),
        ),
        (
            "Dark mode toggle not working",
            "The dark mode toggle in settings does not persist after page refresh.",
            IssueStatus::Closed,
            Priority::Medium,
            (2024, 1, 10),
            (2024, 1, 12),
        ),
    ];

    samples
        .into_iter()
        .map(|(title, description, status, priority, created, updated)| {
            let id = ids
                .generate()
                .map_err(|e| Error::Storage(format!("Sample issue ID: {e}")))?;
            Ok(Issue {
                id: IssueId::new(id),
                title: title.to_string(),
                description: description.to_string(),
                status,
                priority,
                created_at: midnight(created)?,
                updated_at: midnight(updated)?,
                attachments: Vec::new(),
            })
        })
        .collect()
}

fn midnight((year, month, day): (i32, u32, u32)) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::Storage(format!("Invalid date {year}-{month}-{day}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> GrommetConfig {
        GrommetConfig {
            sample_data: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sample_data_ordering_and_counts() {
        let app = App::with_sample_data(GrommetConfig::default()).await.unwrap();

        let issues = app.list_issues(&IssueFilter::default()).await.unwrap();
        let titles: Vec<&str> = issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "API timeout on user profile fetch",
                "Login page not responsive on mobile",
                "Dark mode toggle not working",
            ]
        );
        assert!(issues.iter().all(|i| i.id.as_str().starts_with("issue_")));

        let counts = app.status_counts().await.unwrap();
        assert_eq!(
            counts,
            StatusCounts {
                total: 3,
                open: 1,
                in_progress: 1,
                closed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_from_config_respects_sample_flag() {
        let app = App::from_config(quiet_config()).await.unwrap();
        assert_eq!(app.status_counts().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_create_after_samples_sorts_first() {
        let app = App::with_sample_data(GrommetConfig::default()).await.unwrap();
        let created = app
            .create_issue(NewIssue {
                title: "Fresh".to_string(),
                description: String::new(),
                status: IssueStatus::Open,
                priority: Priority::Low,
            })
            .await
            .unwrap();

        let issues = app.list_issues(&IssueFilter::default()).await.unwrap();
        assert_eq!(issues[0].id, created.id);
    }

    #[tokio::test]
    async fn test_missing_issue_operations() {
        let app = App::new(quiet_config());
        let missing = IssueId::new("issue_missing");

        assert!(app.get_issue(&missing).await.unwrap().is_none());
        assert!(!app.delete_issue(&missing).await.unwrap());
        assert!(
            app.update_issue(&missing, IssueUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            !app.delete_attachment(&missing, &FileId::new("file_missing"))
                .await
                .unwrap()
        );
        assert!(matches!(
            app.download_file(&FileId::new("file_missing")).await,
            Err(Error::FileNotFound(_))
        ));
    }
}
