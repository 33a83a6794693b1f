//! In-memory object store that simulates network latency and progress.

use super::{ObjectStore, ProgressFn};
use crate::domain::{FileId, PresignedUpload};
use crate::error::{Error, Result};
use crate::id_generation::IdGenerator;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

/// Default base URL of the simulated bucket
pub const DEFAULT_BASE_URL: &str = "https://grommet-attachments.s3.amazonaws.com";

/// Longest upload URL lifetime S3 allows for presigned URLs (7 days)
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Timing and behaviour of the simulated store.
///
/// Durations are milliseconds so the YAML stays flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SimulationConfig {
    /// URL objects live under
    pub base_url: String,

    /// Simulated round trip for issuing an upload target
    pub presign_latency_ms: u64,

    /// Lifetime of an upload URL (recorded, never enforced)
    pub url_expiry_secs: u64,

    /// Interval between progress reports
    pub tick_interval_ms: u64,

    /// Upper bound (exclusive) of the random progress added per tick
    pub max_tick_increment: f64,

    /// Progress never reported above this before completion
    pub progress_cap: f64,

    /// Fixed part of the transfer time
    pub base_transfer_ms: u64,

    /// Payload bytes that add one millisecond of transfer time
    pub transfer_bytes_per_ms: u64,

    /// Transfer time never exceeds this
    pub max_transfer_ms: u64,

    /// Probability in `0.0..=1.0` that a transfer fails at its deadline
    pub failure_rate: f64,

    /// Seed for reproducible progress sequences
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            presign_latency_ms: 200,
            url_expiry_secs: 15 * 60,
            tick_interval_ms: 100,
            max_tick_increment: 15.0,
            progress_cap: 95.0,
            base_transfer_ms: 2_000,
            transfer_bytes_per_ms: 1_000,
            max_transfer_ms: 5_000,
            failure_rate: 0.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Time a payload of `size` bytes takes to transfer
    pub fn transfer_duration(&self, size: u64) -> Duration {
        let millis = self
            .base_transfer_ms
            .saturating_add(size / self.transfer_bytes_per_ms.max(1))
            .min(self.max_transfer_ms);
        Duration::from_millis(millis)
    }

    /// Check values the simulator relies on
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "storage.base-url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.base_url.ends_with('/') {
            return Err(Error::Config(
                "storage.base-url must not end with '/'".to_string(),
            ));
        }
        if self.url_expiry_secs > MAX_URL_EXPIRY_SECS {
            return Err(Error::Config(format!(
                "storage.url-expiry-secs cannot exceed {MAX_URL_EXPIRY_SECS}"
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config(
                "storage.tick-interval-ms must be greater than 0".to_string(),
            ));
        }
        if self.transfer_bytes_per_ms == 0 {
            return Err(Error::Config(
                "storage.transfer-bytes-per-ms must be greater than 0".to_string(),
            ));
        }
        if self.max_tick_increment.is_nan() || self.max_tick_increment <= 0.0 {
            return Err(Error::Config(
                "storage.max-tick-increment must be greater than 0".to_string(),
            ));
        }
        if self.progress_cap.is_nan() || self.progress_cap <= 0.0 || self.progress_cap >= 100.0 {
            return Err(Error::Config(
                "storage.progress-cap must be between 0 and 100 (exclusive)".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(Error::Config(
                "storage.failure-rate must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

struct StoreState {
    ids: IdGenerator,
    /// Upload targets handed out and not yet used
    pending: HashMap<FileId, PresignedUpload>,
    objects: HashMap<FileId, Bytes>,
    rng: StdRng,
}

/// Object store kept in memory, with simulated latency and progress.
pub struct SimulatedObjectStore {
    config: SimulationConfig,
    state: Mutex<StoreState>,
}

impl std::fmt::Debug for SimulatedObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedObjectStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SimulatedObjectStore {
    /// Create an empty store whose file IDs start with `file_prefix`
    pub fn new(config: SimulationConfig, file_prefix: impl Into<String>) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Self {
            state: Mutex::new(StoreState {
                ids: IdGenerator::new(file_prefix),
                pending: HashMap::new(),
                objects: HashMap::new(),
                rng,
            }),
            config,
        }
    }

    /// The simulation settings in use
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of stored objects
    pub async fn object_count(&self) -> usize {
        self.state.lock().await.objects.len()
    }

    /// Extract the file ID from an upload URL of this store
    fn file_id_from_url(&self, upload_url: &str) -> Result<FileId> {
        let id = upload_url
            .strip_prefix(self.config.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|id| !id.is_empty() && !id.contains('/'))
            .ok_or_else(|| Error::InvalidUploadUrl(upload_url.to_string()))?;
        Ok(FileId::new(id))
    }

    async fn next_increment(&self) -> f64 {
        let mut state = self.state.lock().await;
        state.rng.gen_range(0.0..self.config.max_tick_increment)
    }
}

#[async_trait]
impl ObjectStore for SimulatedObjectStore {
    async fn issue_upload_target(
        &self,
        filename: &str,
        content_type: &str,
        size: u64,
    ) -> Result<PresignedUpload> {
        sleep(Duration::from_millis(self.config.presign_latency_ms)).await;

        let mut state = self.state.lock().await;
        let file_id = FileId::new(
            state
                .ids
                .generate()
                .map_err(|e| Error::Storage(format!("ID generation failed: {e}")))?,
        );

        let expiry = chrono::Duration::seconds(
            i64::try_from(self.config.url_expiry_secs.min(MAX_URL_EXPIRY_SECS)).unwrap_or(0),
        );
        let target = PresignedUpload {
            upload_url: self.object_url(&file_id),
            file_id: file_id.clone(),
            expires_at: Utc::now() + expiry,
        };
        state.pending.insert(file_id.clone(), target.clone());

        debug!(
            %file_id,
            filename,
            content_type,
            size,
            upload_url = %target.upload_url,
            expires_at = %target.expires_at,
            "Issued upload target"
        );
        Ok(target)
    }

    async fn transfer(
        &self,
        upload_url: &str,
        data: Bytes,
        on_progress: &ProgressFn<'_>,
    ) -> Result<()> {
        let file_id = self.file_id_from_url(upload_url)?;

        if !self.state.lock().await.pending.contains_key(&file_id) {
            return Err(Error::Transfer {
                file_id,
                reason: "no upload target was issued for this URL".to_string(),
            });
        }

        let size = data.len() as u64;
        let tick = Duration::from_millis(self.config.tick_interval_ms);
        let deadline = sleep(self.config.transfer_duration(size));
        tokio::pin!(deadline);

        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut progress = 0.0_f64;
        loop {
            tokio::select! {
                biased;
                () = &mut deadline => break,
                _ = ticker.tick() => {
                    let increment = self.next_increment().await;
                    progress = (progress + increment).min(self.config.progress_cap);
                    on_progress(progress);
                }
            }
        }

        let mut state = self.state.lock().await;
        state.pending.remove(&file_id);

        if self.config.failure_rate > 0.0 && state.rng.gen_bool(self.config.failure_rate) {
            warn!(%file_id, size, "Simulated transfer failure");
            return Err(Error::Transfer {
                file_id,
                reason: "simulated storage failure".to_string(),
            });
        }

        on_progress(100.0);
        state.objects.insert(file_id.clone(), data);
        info!(%file_id, size, "Stored object");
        Ok(())
    }

    async fn retrieve(&self, file_id: &FileId) -> Result<Bytes> {
        self.state
            .lock()
            .await
            .objects
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::FileNotFound(file_id.clone()))
    }

    async fn delete(&self, file_id: &FileId) -> Result<bool> {
        let removed = self.state.lock().await.objects.remove(file_id).is_some();
        if removed {
            debug!(%file_id, "Deleted object");
        }
        Ok(removed)
    }

    fn object_url(&self, file_id: &FileId) -> String {
        format!("{}/{}", self.config.base_url, file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn test_config() -> SimulationConfig {
        SimulationConfig {
            seed: Some(7),
            ..Default::default()
        }
    }

    fn recorder() -> (std::sync::Arc<StdMutex<Vec<f64>>>, impl Fn(f64) + Send + Sync) {
        let seen = std::sync::Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |p| sink.lock().unwrap().push(p))
    }

    #[test]
    fn test_transfer_duration_is_bounded() {
        let config = SimulationConfig::default();
        assert_eq!(config.transfer_duration(0), Duration::from_millis(2_000));
        assert_eq!(
            config.transfer_duration(500_000),
            Duration::from_millis(2_500)
        );
        assert_eq!(
            config.transfer_duration(10 * 1024 * 1024),
            Duration::from_millis(5_000)
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            SimulationConfig {
                base_url: "ftp://bucket".to_string(),
                ..Default::default()
            },
            SimulationConfig {
                base_url: "https://bucket/".to_string(),
                ..Default::default()
            },
            SimulationConfig {
                progress_cap: 100.0,
                ..Default::default()
            },
            SimulationConfig {
                failure_rate: 1.5,
                ..Default::default()
            },
            SimulationConfig {
                tick_interval_ms: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_issue_upload_target() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let before = Utc::now();

        let target = store
            .issue_upload_target("report.pdf", "application/pdf", 1024)
            .await
            .unwrap();

        assert!(target.file_id.as_str().starts_with("file_"));
        assert_eq!(
            target.upload_url,
            format!("{DEFAULT_BASE_URL}/{}", target.file_id)
        );
        let expiry = target.expires_at - before;
        assert!(expiry >= chrono::Duration::minutes(15));
        assert!(expiry < chrono::Duration::minutes(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_progress_then_retrieve() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let target = store
            .issue_upload_target("notes.txt", "text/plain", 5)
            .await
            .unwrap();
        let (seen, on_progress) = recorder();

        store
            .transfer(&target.upload_url, Bytes::from_static(b"hello"), &on_progress)
            .await
            .unwrap();

        let seen = seen.lock().unwrap().clone();
        let (last, ticks) = seen.split_last().unwrap();
        assert_eq!(*last, 100.0);
        // 2000ms transfer at 100ms ticks: ticks at 100..=1900
        assert_eq!(ticks.len(), 19);
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
        assert!(ticks.iter().all(|p| *p <= 95.0));

        let stored = store.retrieve(&target.file_id).await.unwrap();
        assert_eq!(stored.as_ref(), b"hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_accepts_borrowing_callback() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let target = store
            .issue_upload_target("notes.txt", "text/plain", 2)
            .await
            .unwrap();
        let label = String::from("notes.txt");
        let seen = std::sync::Mutex::new(Vec::new());
        let on_progress = |progress: f64| {
            seen.lock().unwrap().push((label.as_str().len(), progress));
        };

        store
            .transfer(&target.upload_url, Bytes::from_static(b"hi"), &on_progress)
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.last(), Some(&(9, 100.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_rejects_foreign_url() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let (_, on_progress) = recorder();

        let result = store
            .transfer(
                "https://elsewhere.example/file_1",
                Bytes::new(),
                &on_progress,
            )
            .await;

        assert!(matches!(result, Err(Error::InvalidUploadUrl(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_requires_issued_target() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let (seen, on_progress) = recorder();
        let url = format!("{DEFAULT_BASE_URL}/file_0_000000000");

        let result = store.transfer(&url, Bytes::new(), &on_progress).await;

        assert!(matches!(result, Err(Error::Transfer { .. })));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_is_single_use() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let target = store
            .issue_upload_target("a.txt", "text/plain", 1)
            .await
            .unwrap();
        let (_, on_progress) = recorder();

        store
            .transfer(&target.upload_url, Bytes::from_static(b"a"), &on_progress)
            .await
            .unwrap();
        let again = store
            .transfer(&target.upload_url, Bytes::from_static(b"b"), &on_progress)
            .await;

        assert!(matches!(again, Err(Error::Transfer { .. })));
        let stored = store.retrieve(&target.file_id).await.unwrap();
        assert_eq!(stored.as_ref(), b"a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_failure_stores_nothing() {
        let config = SimulationConfig {
            failure_rate: 1.0,
            ..test_config()
        };
        let store = SimulatedObjectStore::new(config, "file");
        let target = store
            .issue_upload_target("a.txt", "text/plain", 1)
            .await
            .unwrap();
        let (seen, on_progress) = recorder();

        let result = store
            .transfer(&target.upload_url, Bytes::from_static(b"a"), &on_progress)
            .await;

        assert!(matches!(result, Err(Error::Transfer { .. })));
        assert!(!seen.lock().unwrap().contains(&100.0));
        assert!(matches!(
            store.retrieve(&target.file_id).await,
            Err(Error::FileNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_is_idempotent() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let target = store
            .issue_upload_target("a.txt", "text/plain", 1)
            .await
            .unwrap();
        let (_, on_progress) = recorder();
        store
            .transfer(&target.upload_url, Bytes::from_static(b"a"), &on_progress)
            .await
            .unwrap();

        assert!(store.delete(&target.file_id).await.unwrap());
        assert!(!store.delete(&target.file_id).await.unwrap());
        assert_eq!(store.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_retrieve_unknown_file() {
        let store = SimulatedObjectStore::new(test_config(), "file");
        let result = store.retrieve(&FileId::new("file_missing")).await;
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
