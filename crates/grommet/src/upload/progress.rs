//! Latest upload progress per file, for observers that poll.

use crate::domain::UploadProgress;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct TrackerState {
    /// Latest event per file, in first-seen order
    files: Vec<UploadProgress>,
    /// Batches begun and not yet finished
    active_batches: usize,
    /// Bumped whenever a batch begins or settles
    epoch: u64,
}

/// Shared view of in-flight and recently settled uploads.
///
/// The tracker is updated from synchronous progress callbacks, so it uses a
/// std mutex that is never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl ProgressTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a batch as started
    pub fn begin_batch(&self) {
        let mut state = self.lock();
        state.active_batches += 1;
        state.epoch += 1;
    }

    /// Replace the stored state of the event's file
    pub fn record(&self, event: &UploadProgress) {
        let mut state = self.lock();
        let existing = state.files.iter_mut().find(|entry| same_file(entry, event));
        match existing {
            Some(entry) => *entry = event.clone(),
            None => state.files.push(event.clone()),
        }
    }

    /// Mark a batch as settled and clear the tracker after `clear_delay`.
    ///
    /// The clear is skipped if any batch began or settled in the meantime.
    /// Whichever batch settles last schedules the clear that runs.
    pub fn finish_batch(&self, clear_delay: Duration) {
        let token = {
            let mut state = self.lock();
            state.active_batches = state.active_batches.saturating_sub(1);
            state.epoch += 1;
            state.epoch
        };

        let tracker = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(clear_delay).await;
            let mut state = tracker.lock();
            if state.epoch == token && state.active_batches == 0 {
                debug!(epoch = token, "Clearing upload progress");
                state.files.clear();
            }
        });
    }

    /// Latest event per file
    pub fn snapshot(&self) -> Vec<UploadProgress> {
        self.lock().files.clone()
    }

    /// Whether any batch is in flight
    pub fn is_uploading(&self) -> bool {
        self.lock().active_batches > 0
    }
}

fn same_file(a: &UploadProgress, b: &UploadProgress) -> bool {
    match (&a.file_id, &b.file_id) {
        (Some(a), Some(b)) => a == b,
        (None, None) => a.file_name == b.file_name,
        _ => false,
    }
}
