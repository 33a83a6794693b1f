//! Color and styling helpers for terminal output.
//!
//! Semantic Color Theme:
//!   - Success/Done:  green   (closed status, completed uploads)
//!   - Warning/Active: yellow (in-progress status, high priority, running uploads)
//!   - Error:         red     (urgent priority, failed uploads)
//!   - Info/Reference: cyan   (issue and file IDs)
//!   - Accent:        magenta (attachment counts)
//!   - Muted:         dimmed  (field labels, sizes, low priority)
//!   - Emphasis:      bold    (section headers)
//!   - Default:       white   (open status)

use crate::domain::{IssueStatus, Priority, UploadStatus};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply color to status text based on issue status.
pub(crate) fn colorize_status(status: IssueStatus, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        IssueStatus::Open => text.white().to_string(),
        IssueStatus::InProgress => text.yellow().to_string(),
        IssueStatus::Closed => text.green().to_string(),
    }
}

/// Apply color to priority text based on priority level.
pub(crate) fn colorize_priority(priority: Priority, config: &OutputConfig) -> String {
    let text = priority.to_string();
    if !config.use_colors {
        return text;
    }
    match priority {
        Priority::Urgent => text.red().bold().to_string(),
        Priority::High => text.yellow().to_string(),
        Priority::Medium => text,
        Priority::Low => text.dimmed().to_string(),
    }
}

/// Colorize an issue or file ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Get a colored status icon, with ASCII fallback support.
pub(crate) fn colored_status_icon(status: IssueStatus, config: &OutputConfig) -> String {
    let icon = if config.use_ascii {
        match status {
            IssueStatus::Open => "o",
            IssueStatus::InProgress => ">",
            IssueStatus::Closed => "+",
        }
    } else {
        match status {
            IssueStatus::Open => "○",
            IssueStatus::InProgress => "▶",
            IssueStatus::Closed => "✓",
        }
    };

    if !config.use_colors {
        return icon.to_string();
    }

    match status {
        IssueStatus::Open => icon.white().to_string(),
        IssueStatus::InProgress => icon.yellow().to_string(),
        IssueStatus::Closed => icon.green().to_string(),
    }
}

/// Icon for an attachment, chosen by content type.
pub(crate) fn file_icon(content_type: &str, config: &OutputConfig) -> &'static str {
    let is_image = content_type.starts_with("image/");
    match (config.use_ascii, is_image) {
        (true, true) => "[img]",
        (true, false) => "[doc]",
        (false, true) => "▣",
        (false, false) => "▤",
    }
}

/// Colored marker for an upload state.
pub(crate) fn upload_status_icon(status: UploadStatus, config: &OutputConfig) -> String {
    let icon = match (config.use_ascii, status) {
        (true, UploadStatus::Uploading) => "~",
        (true, UploadStatus::Completed) => "+",
        (true, UploadStatus::Error) => "x",
        (false, UploadStatus::Uploading) => "↑",
        (false, UploadStatus::Completed) => "✓",
        (false, UploadStatus::Error) => "✗",
    };
    match status {
        UploadStatus::Uploading => warning(icon, config),
        UploadStatus::Completed => success(icon, config),
        UploadStatus::Error => error(icon, config),
    }
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Apply magenta color to text.
pub(crate) fn magenta(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.magenta().to_string()
}
