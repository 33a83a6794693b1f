//! Type and size policy for uploaded files.

use crate::domain::CandidateFile;
use crate::error::ValidationError;

/// Largest accepted upload: 10 MiB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// MIME types accepted by default
pub const ALLOWED_CONTENT_TYPES: [&str; 10] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Which files may be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Largest accepted file in bytes (inclusive)
    pub max_file_size: u64,

    /// Accepted MIME types, compared case-insensitively
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            allowed_content_types: ALLOWED_CONTENT_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl UploadPolicy {
    /// Whether the content type is on the allow-list
    pub fn is_allowed_type(&self, content_type: &str) -> bool {
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }

    /// Whether the size is within the limit
    pub fn is_allowed_size(&self, size: u64) -> bool {
        size <= self.max_file_size
    }

    /// Check a file against the policy: type first, then size.
    pub fn validate(&self, file: &CandidateFile) -> Result<(), ValidationError> {
        if !self.is_allowed_type(&file.content_type) {
            return Err(ValidationError::UnsupportedContentType {
                file_name: file.name.clone(),
                content_type: file.content_type.clone(),
            });
        }

        let size = file.size();
        if !self.is_allowed_size(size) {
            return Err(ValidationError::FileTooLarge {
                file_name: file.name.clone(),
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }
}
