//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for grommet using clap's derive API.
//! Each command has its own argument struct with validation and helpful error messages.
//!
//! # Commands
//!
//! - `create`: Create a new issue
//! - `list`: List issues with optional filters
//! - `show`: Show issue details and attachments
//! - `update`: Update an existing issue
//! - `delete`: Delete an issue and its files
//! - `attach`: Upload files to an issue
//! - `detach`: Remove an attachment
//! - `download`: Save an uploaded file to disk
//! - `files`: List the files of an issue
//! - `stats`: Show issue totals per status
//!
//! Without a command, grommet runs an interactive session that accepts the
//! same commands one per line.
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--config <PATH>`: Load settings from a YAML file
//! - `--no-sample-data`: Start with an empty tracker
//!
//! # Example
//!
//! ```bash
//! grommet create "Fix login layout" --priority high
//! grommet list --status open --search login
//! grommet --script demo.grommet
//! ```

mod args;
mod execute;
mod session;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::io::BufReader;

use crate::app::App;
use crate::config::GrommetConfig;
use crate::output::{OutputMode, Printer};

// Re-export argument structs
pub use args::{
    AttachArgs, CreateArgs, DeleteArgs, DetachArgs, DownloadArgs, FilesArgs, ListArgs, ShowArgs,
    StatsArgs, UpdateArgs,
};

// Re-export types
pub use types::{IssueStatusArg, PriorityArg};

// Re-export validators for external use
pub use validators::{
    validate_content_type, validate_description, validate_file_id, validate_issue_id,
    validate_title,
};

pub use execute::{guess_content_type, run};
pub use session::{PROMPT, SessionSummary, TokenizeError, help_text, run_session, tokenize};

/// Grommet - an issue tracker with file attachments
///
/// Issues are kept in memory for the lifetime of the process. Attachments go
/// through a simulated object store with presigned upload URLs.
#[derive(Parser, Debug)]
#[command(name = "grommet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (YAML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Start without the sample issues
    #[arg(long, global = true)]
    pub no_sample_data: bool,

    /// Run session commands from a file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new issue
    Create(CreateArgs),

    /// List issues with optional filters
    ///
    /// Issues are shown most recently updated first, followed by the
    /// number of issues per status.
    List(ListArgs),

    /// Show detailed information about an issue
    ///
    /// Displays all fields of an issue including its attachments.
    Show(ShowArgs),

    /// Update an existing issue
    ///
    /// Modifies one or more fields of an existing issue. Only provided fields
    /// are updated; other fields remain unchanged.
    Update(UpdateArgs),

    /// Delete an issue permanently
    ///
    /// Removes the issue together with its uploaded files.
    Delete(DeleteArgs),

    /// Upload files to an issue
    ///
    /// Files are uploaded one at a time. Only images, PDFs, plain text and
    /// Office documents up to 10 MB are accepted; the first rejected or
    /// failed file stops the batch.
    Attach(AttachArgs),

    /// Remove an attachment from an issue
    Detach(DetachArgs),

    /// Save an uploaded file to disk
    Download(DownloadArgs),

    /// List the files uploaded to an issue
    Files(FilesArgs),

    /// Show issue totals per status
    Stats(StatsArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Output mode selected by the flags
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Configuration from `--config` (or defaults) with flag overrides applied
    pub async fn load_config(&self) -> Result<GrommetConfig> {
        let mut config = match &self.config {
            Some(path) => GrommetConfig::load(path).await?,
            None => GrommetConfig::default(),
        };
        if self.no_sample_data {
            config.sample_data = false;
        }
        Ok(config)
    }

    /// Execute the CLI command, or run a session when none is given
    pub async fn execute(&self) -> Result<()> {
        if self.script.is_some() && self.command.is_some() {
            anyhow::bail!("--script cannot be combined with a command");
        }

        let app = App::from_config(self.load_config().await?).await?;
        let mode = self.output_mode();
        let mut printer = Printer::stdout(mode);

        if let Some(command) = &self.command {
            return execute::run(&app, command, &mut printer).await;
        }

        let summary = match &self.script {
            Some(path) => {
                let file = tokio::fs::File::open(path).await?;
                run_session(&app, BufReader::new(file), &mut printer, false).await?
            }
            None => {
                let prompt = mode == OutputMode::Text && std::io::stdin().is_terminal();
                if prompt {
                    printer.line("Type `help` for commands, `exit` to quit.")?;
                }
                run_session(&app, BufReader::new(tokio::io::stdin()), &mut printer, prompt)
                    .await?
            }
        };

        tracing::debug!(
            executed = summary.executed,
            failed = summary.failed,
            "Session finished"
        );
        if self.script.is_some() && summary.failed > 0 {
            anyhow::bail!("{} of {} script command(s) failed", summary.failed, summary.executed);
        }
        Ok(())
    }
}
