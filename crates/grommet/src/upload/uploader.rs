//! Sequential upload pipeline.

use super::{ProgressTracker, UploadPolicy};
use crate::domain::{CandidateFile, FileId, FileMetadata, IssueId, UploadProgress};
use crate::error::{BatchError, Error, Result};
use crate::files::FileRegistry;
use crate::object_store::ObjectStore;
use crate::storage::SharedStorage;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Fans every event out to the tracker and the optional subscriber.
struct EventSink {
    tracker: ProgressTracker,
    events: Option<UnboundedSender<UploadProgress>>,
}

impl EventSink {
    fn emit(&self, event: UploadProgress) {
        self.tracker.record(&event);
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }
}

/// Why a single file did not complete.
struct FileFailure {
    file_id: Option<FileId>,
    error: Error,
}

impl FileFailure {
    fn before_target(error: impl Into<Error>) -> Self {
        Self {
            file_id: None,
            error: error.into(),
        }
    }

    fn for_file(file_id: &FileId, error: Error) -> Self {
        Self {
            file_id: Some(file_id.clone()),
            error,
        }
    }
}

/// Moves batches of candidate files into the object store and onto an issue.
pub struct Uploader {
    storage: SharedStorage,
    registry: FileRegistry,
    object_store: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
    tracker: ProgressTracker,
    clear_delay: Duration,
}

impl Uploader {
    /// Create an uploader over shared service handles
    pub fn new(
        storage: SharedStorage,
        registry: FileRegistry,
        object_store: Arc<dyn ObjectStore>,
        policy: UploadPolicy,
        clear_delay: Duration,
    ) -> Self {
        Self {
            storage,
            registry,
            object_store,
            policy,
            tracker: ProgressTracker::new(),
            clear_delay,
        }
    }

    /// The policy files are validated against
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Latest progress of recent batches
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Upload files to an issue, one after another.
    ///
    /// Each file is validated, transferred, registered and attached before
    /// the next one starts. Progress events go to the tracker and, when
    /// given, to `events`. The first failure stops the batch; files that
    /// completed before it stay attached.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] carrying the completed files when the issue
    /// is missing or any file fails.
    pub async fn upload_batch(
        &self,
        issue_id: &IssueId,
        files: Vec<CandidateFile>,
        events: Option<UnboundedSender<UploadProgress>>,
    ) -> std::result::Result<Vec<FileMetadata>, BatchError> {
        let exists = self
            .storage
            .read()
            .await
            .get(issue_id)
            .await
            .map_err(BatchError::before_start)?
            .is_some();
        if !exists {
            return Err(BatchError::before_start(Error::IssueNotFound(
                issue_id.clone(),
            )));
        }

        let sink = EventSink {
            tracker: self.tracker.clone(),
            events,
        };
        self.tracker.begin_batch();
        info!(issue_id = %issue_id, files = files.len(), "Starting upload batch");

        let mut completed = Vec::with_capacity(files.len());
        let mut failure = None;
        for file in files {
            match self.upload_one(issue_id, &file, &sink).await {
                Ok(metadata) => completed.push(metadata),
                Err(FileFailure { file_id, error }) => {
                    sink.emit(UploadProgress::failed(file_id, &file.name, error.to_string()));
                    failure = Some((file.name, error));
                    break;
                }
            }
        }

        self.tracker.finish_batch(self.clear_delay);

        match failure {
            None => {
                info!(issue_id = %issue_id, files = completed.len(), "Upload batch completed");
                Ok(completed)
            }
            Some((file_name, source)) => {
                warn!(
                    issue_id = %issue_id,
                    file_name = %file_name,
                    completed = completed.len(),
                    error = %source,
                    "Upload batch failed"
                );
                Err(BatchError {
                    completed,
                    file_name: Some(file_name),
                    source,
                })
            }
        }
    }

    async fn upload_one(
        &self,
        issue_id: &IssueId,
        file: &CandidateFile,
        sink: &EventSink,
    ) -> std::result::Result<FileMetadata, FileFailure> {
        self.policy
            .validate(file)
            .map_err(FileFailure::before_target)?;

        let target = self
            .object_store
            .issue_upload_target(&file.name, &file.content_type, file.size())
            .await
            .map_err(FileFailure::before_target)?;
        let file_id = target.file_id;

        sink.emit(UploadProgress::uploading(file_id.clone(), &file.name, 0.0));
        let relay = |progress: f64| {
            sink.emit(UploadProgress::uploading(
                file_id.clone(),
                &file.name,
                progress,
            ));
        };
        self.object_store
            .transfer(&target.upload_url, file.data.clone(), &relay)
            .await
            .map_err(|e| FileFailure::for_file(&file_id, e))?;

        let metadata = FileMetadata {
            id: file_id.clone(),
            filename: file_id.to_string(),
            original_name: file.name.clone(),
            size: file.size(),
            content_type: file.content_type.clone(),
            uploaded_at: Utc::now(),
            url: self.object_store.object_url(&file_id),
            issue_id: issue_id.clone(),
        };
        self.register(metadata.clone())
            .await
            .map_err(|e| FileFailure::for_file(&file_id, e))?;

        sink.emit(UploadProgress::completed(file_id.clone(), &file.name));
        debug!(file_id = %file_id, size = metadata.size, "File uploaded");
        Ok(metadata)
    }

    /// Record the metadata and attach it to its issue.
    ///
    /// If the issue disappeared while the bytes were in flight, the stored
    /// object and its record are dropped again.
    async fn register(&self, metadata: FileMetadata) -> Result<()> {
        self.registry.put(metadata.clone()).await;

        let issue_id = metadata.issue_id.clone();
        let file_id = metadata.id.clone();
        let attached = self
            .storage
            .write()
            .await
            .add_attachment(&issue_id, metadata)
            .await?;
        if attached {
            return Ok(());
        }

        warn!(issue_id = %issue_id, file_id = %file_id, "Issue deleted during upload");
        self.registry.delete(&file_id).await;
        self.object_store.delete(&file_id).await?;
        Err(Error::IssueNotFound(issue_id))
    }
}
