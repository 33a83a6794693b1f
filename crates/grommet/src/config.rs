//! Configuration management for grommet.
//!
//! Configuration is an optional YAML file. Every key has a default, so a
//! file only needs the values it overrides:
//!
//! ```yaml
//! issue-prefix: bug
//! sample-data: false
//! storage:
//!   base-url: https://attachments.internal.example
//!   presign-latency-ms: 50
//! upload:
//!   max-file-size: 1048576
//! ```

use crate::error::{Error, Result};
use crate::object_store::SimulationConfig;
use crate::upload::UploadPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Default issue ID prefix
pub const DEFAULT_ISSUE_PREFIX: &str = "issue";

/// Default file ID prefix
pub const DEFAULT_FILE_PREFIX: &str = "file";

/// Minimum prefix length
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Delay before settled upload progress is cleared
pub const DEFAULT_PROGRESS_CLEAR_DELAY_MS: u64 = 2_000;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct GrommetConfig {
    /// Issue ID prefix (e.g., "issue" for "issue_1718000000000_k3x9a0q2m")
    pub issue_prefix: String,

    /// Prefix for stored file IDs
    pub file_prefix: String,

    /// Seed the tracker with the sample issues on start-up
    pub sample_data: bool,

    /// Object storage simulation settings
    pub storage: SimulationConfig,

    /// Upload policy settings
    pub upload: UploadConfig,
}

impl Default for GrommetConfig {
    fn default() -> Self {
        Self {
            issue_prefix: DEFAULT_ISSUE_PREFIX.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            sample_data: true,
            storage: SimulationConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

/// Upload section of the configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct UploadConfig {
    /// Largest accepted file in bytes
    pub max_file_size: u64,

    /// Accepted MIME types
    pub allowed_content_types: Vec<String>,

    /// How long settled progress stays visible, in milliseconds
    pub progress_clear_delay_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let policy = UploadPolicy::default();
        Self {
            max_file_size: policy.max_file_size,
            allowed_content_types: policy.allowed_content_types,
            progress_clear_delay_ms: DEFAULT_PROGRESS_CLEAR_DELAY_MS,
        }
    }
}

impl UploadConfig {
    /// The validation policy described by this section
    pub fn policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_file_size: self.max_file_size,
            allowed_content_types: self.allowed_content_types.clone(),
        }
    }

    /// Delay before settled progress is cleared
    pub fn progress_clear_delay(&self) -> Duration {
        Duration::from_millis(self.progress_clear_delay_ms)
    }
}

impl GrommetConfig {
    /// Load configuration from a YAML file and validate it
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot express constraints for
    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.issue_prefix)?;
        validate_prefix(&self.file_prefix)?;
        self.storage.validate()?;

        if self.upload.max_file_size == 0 {
            return Err(Error::Config(
                "upload.max-file-size must be greater than 0".to_string(),
            ));
        }
        if self.upload.allowed_content_types.is_empty() {
            return Err(Error::Config(
                "upload.allowed-content-types cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Validate ID prefix format.
///
/// Requirements:
/// - 2-20 characters
/// - Alphanumeric only (letters and digits)
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(Error::Config(format!(
            "Prefix must be at least {MIN_PREFIX_LENGTH} characters"
        )));
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(Error::Config(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        )));
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Config(
            "Prefix must contain only alphanumeric characters".to_string(),
        ));
    }

    Ok(())
}
