//! Upload orchestration.
//!
//! An upload batch moves client files onto an issue: every file is checked
//! against the [`UploadPolicy`], sent to the object store through a
//! presigned target, recorded in the file registry and appended to the
//! issue's attachments. Progress is published per file as
//! [`UploadProgress`](crate::domain::UploadProgress) events and kept in a
//! [`ProgressTracker`] for polling.

mod policy;
mod progress;
mod uploader;

pub use policy::{ALLOWED_CONTENT_TYPES, MAX_FILE_SIZE, UploadPolicy};
pub use progress::ProgressTracker;
pub use uploader::Uploader;
