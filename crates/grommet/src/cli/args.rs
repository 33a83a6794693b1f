//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;
use std::path::PathBuf;

use super::types::{IssueStatusArg, PriorityArg};
use super::validators::{
    validate_content_type, validate_description, validate_file_id, validate_issue_id,
    validate_title,
};

/// Arguments for the `create` command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Issue title (maximum 200 characters)
    #[arg(value_parser = validate_title)]
    pub title: String,

    /// Detailed description
    #[arg(short = 'D', long, value_parser = validate_description, default_value = "")]
    pub description: String,

    /// Initial status
    #[arg(short, long, value_enum, default_value_t = IssueStatusArg::Open)]
    pub status: IssueStatusArg,

    /// Priority level
    #[arg(short, long, value_enum, default_value_t = PriorityArg::Medium)]
    pub priority: PriorityArg,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<IssueStatusArg>,

    /// Filter by priority
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Case-insensitive text matched against title and description
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Maximum number of issues to display
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Issue ID(s) to display
    #[arg(required = true, value_parser = validate_issue_id)]
    pub issue_ids: Vec<String>,
}

/// Arguments for the `update` command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Issue ID to update
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,

    /// New title (maximum 200 characters)
    #[arg(long, value_parser = validate_title)]
    pub title: Option<String>,

    /// New description
    #[arg(short = 'D', long, value_parser = validate_description)]
    pub description: Option<String>,

    /// New status
    #[arg(short, long, value_enum)]
    pub status: Option<IssueStatusArg>,

    /// New priority
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,
}

/// Arguments for the `delete` command
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Issue ID to delete
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,
}

/// Arguments for the `attach` command
#[derive(Parser, Debug, Clone)]
pub struct AttachArgs {
    /// Issue to attach the files to
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,

    /// Files to upload, in order
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Content type for every file (guessed from the extension otherwise)
    #[arg(short = 't', long, value_parser = validate_content_type)]
    pub content_type: Option<String>,
}

/// Arguments for the `detach` command
#[derive(Parser, Debug, Clone)]
pub struct DetachArgs {
    /// Issue the file is attached to
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,

    /// File to remove
    #[arg(value_parser = validate_file_id)]
    pub file_id: String,
}

/// Arguments for the `download` command
#[derive(Parser, Debug, Clone)]
pub struct DownloadArgs {
    /// File to download
    #[arg(value_parser = validate_file_id)]
    pub file_id: String,

    /// Destination path (defaults to the original file name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `files` command
#[derive(Parser, Debug, Clone)]
pub struct FilesArgs {
    /// Issue whose files to list
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {}
