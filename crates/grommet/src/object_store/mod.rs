//! Object storage for attachment bytes.
//!
//! Uploads follow the presigned-URL contract of S3-style stores: the client
//! first asks for an upload target, then sends the bytes to the URL it was
//! given. Downloads go by file ID.
//!
//! The only backend, [`SimulatedObjectStore`], performs no network I/O: it
//! waits out configurable delays, reports synthetic progress, and keeps the
//! bytes in memory. Its URLs follow the `{base_url}/{file_id}` convention and
//! carry no signature, so they are not a security boundary.

mod simulated;

pub use simulated::{SimulatedObjectStore, SimulationConfig};

use crate::domain::{FileId, PresignedUpload};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Callback receiving transfer progress as a percentage in `0.0..=100.0`.
pub type ProgressFn<'a> = dyn Fn(f64) + Send + Sync + 'a;

/// Presigned-URL object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issue an upload target for a file that is about to be sent.
    async fn issue_upload_target(
        &self,
        filename: &str,
        content_type: &str,
        size: u64,
    ) -> Result<PresignedUpload>;

    /// Send bytes to an upload URL obtained from [`Self::issue_upload_target`].
    ///
    /// `on_progress` is called with non-decreasing percentages; the last call
    /// on success is exactly `100.0`. There is no cancellation: once started,
    /// the transfer runs to completion or failure.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidUploadUrl` if the URL does not belong to this store
    /// - `Error::Transfer` if no target was issued for the URL or the
    ///   store rejected the upload
    async fn transfer(&self, upload_url: &str, data: Bytes, on_progress: &ProgressFn<'_>)
    -> Result<()>;

    /// Fetch the bytes of a stored file.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file was never uploaded or has
    /// been deleted.
    async fn retrieve(&self, file_id: &FileId) -> Result<Bytes>;

    /// Delete a stored file. Returns whether it existed.
    async fn delete(&self, file_id: &FileId) -> Result<bool>;

    /// Retrieval URL for a file ID.
    fn object_url(&self, file_id: &FileId) -> String;
}
