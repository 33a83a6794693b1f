//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)
//! - `json`: JSON serialization for programmatic output

pub mod color;
mod json;

use crate::domain::{FileMetadata, Issue, StatusCounts, UploadProgress, UploadStatus};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};

use color::{
    bold, colored_status_icon, colorize_id, colorize_priority, colorize_status, dimmed, file_icon,
    magenta, upload_status_icon,
};
use json::{
    print_files_json, print_issue_json, print_issues_json, print_stats_json, print_value_json,
};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Width of the text progress bar, in cells
const PROGRESS_BAR_WIDTH: usize = 20;

/// Percentage points between printed progress lines for one file
const PROGRESS_REPORT_STEP: f64 = 25.0;

/// Configuration for output formatting.
///
/// This struct holds settings that control how output is formatted,
/// including terminal width limits, ASCII fallback mode, and color output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `GROMMET_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `GROMMET_ASCII`: Set to "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `GROMMET_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create an OutputConfig from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("GROMMET_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "GROMMET_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("GROMMET_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "GROMMET_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // NO_COLOR (https://no-color.org/) wins over GROMMET_COLOR
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("GROMMET_COLOR")
                .is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH as usize)
}

// ============================================================================
// Printer
// ============================================================================

/// Writes command results to a sink in the selected mode.
///
/// Commands print through a `Printer` rather than to stdout directly so a
/// session can be replayed against an in-memory buffer.
pub struct Printer<W: Write> {
    writer: W,
    mode: OutputMode,
    config: OutputConfig,
    /// Last printed percentage per file during an upload
    reported: HashMap<String, f64>,
}

impl Printer<io::Stdout> {
    /// Printer for stdout, styled from the environment
    pub fn stdout(mode: OutputMode) -> Self {
        Self::new(io::stdout(), mode, OutputConfig::from_env())
    }
}

impl<W: Write> Printer<W> {
    /// Create a printer over any writer
    pub fn new(writer: W, mode: OutputMode, config: OutputConfig) -> Self {
        Self {
            writer,
            mode,
            config,
            reported: HashMap::new(),
        }
    }

    /// The selected output mode
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Styling settings
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Consume the printer, returning the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Print a one-line summary of an issue
    pub fn issue(&mut self, issue: &Issue) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => print_issue_line(&mut self.writer, issue, &self.config),
            OutputMode::Json => print_issue_json(&mut self.writer, issue),
        }
    }

    /// Print a list of issues, followed by the status summary in text mode
    pub fn issues(&mut self, issues: &[Issue], counts: &StatusCounts) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => print_issues_text(&mut self.writer, issues, counts, &self.config),
            OutputMode::Json => print_issues_json(&mut self.writer, issues),
        }
    }

    /// Print an issue with full details (for show command)
    pub fn issue_details(&mut self, issue: &Issue) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => print_issue_details_text(&mut self.writer, issue, &self.config),
            OutputMode::Json => print_issue_json(&mut self.writer, issue),
        }
    }

    /// Print the registered files of an issue
    pub fn files(&mut self, files: &[FileMetadata]) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => print_files_text(&mut self.writer, files, &self.config),
            OutputMode::Json => print_files_json(&mut self.writer, files),
        }
    }

    /// Print totals per status
    pub fn stats(&mut self, counts: &StatusCounts) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => print_stats_text(&mut self.writer, counts, &self.config),
            OutputMode::Json => print_stats_json(&mut self.writer, counts),
        }
    }

    /// Print an upload progress event.
    ///
    /// Text mode prints the first and terminal event of every file and
    /// in-flight events every [`PROGRESS_REPORT_STEP`] points. JSON mode
    /// prints nothing; the batch result carries the outcome.
    pub fn progress(&mut self, event: &UploadProgress) -> io::Result<()> {
        if self.mode == OutputMode::Json {
            return Ok(());
        }

        let key = event
            .file_id
            .as_ref()
            .map_or_else(|| event.file_name.clone(), ToString::to_string);
        if event.status == UploadStatus::Uploading {
            let due = self
                .reported
                .get(&key)
                .is_none_or(|last| event.progress - last >= PROGRESS_REPORT_STEP);
            if !due {
                return Ok(());
            }
            self.reported.insert(key, event.progress);
        } else {
            self.reported.remove(&key);
        }

        print_progress_text(&mut self.writer, event, &self.config)
    }

    /// Print the files a batch uploaded
    pub fn upload_result(&mut self, uploaded: &[FileMetadata]) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => print_upload_text(&mut self.writer, uploaded, &self.config),
            OutputMode::Json => print_files_json(&mut self.writer, uploaded),
        }
    }

    /// Print a status message in text mode, or the given value in JSON mode
    pub fn message<T: Serialize>(&mut self, text: &str, value: &T) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => writeln!(self.writer, "{text}"),
            OutputMode::Json => print_value_json(&mut self.writer, value),
        }
    }

    /// Print a failure. Text goes to the printer's sink so sessions keep
    /// their order; JSON prints an `error` object.
    pub fn failure(&mut self, message: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => {
                let prefix = error("Error:", &self.config);
                writeln!(self.writer, "{prefix} {message}")
            }
            OutputMode::Json => {
                print_value_json(&mut self.writer, &serde_json::json!({ "error": message }))
            }
        }
    }

    /// Print plain text regardless of mode
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{text}")
    }

    /// Print a prompt without a line break
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.writer, "{text}")?;
        self.writer.flush()
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

// ============================================================================
// Formatting Helpers
// ============================================================================

/// Human-readable size with binary units, rounded to two decimals.
///
/// ```
/// use grommet::output::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

fn progress_bar(progress: f64, config: &OutputConfig) -> String {
    let (full, empty) = if config.use_ascii {
        ('#', '.')
    } else {
        ('█', '░')
    };
    let ratio = (progress / 100.0).clamp(0.0, 1.0);
    let filled = (ratio * PROGRESS_BAR_WIDTH as f64).round() as usize;
    let mut bar = String::with_capacity(PROGRESS_BAR_WIDTH * 3);
    bar.extend(std::iter::repeat_n(full, filled));
    bar.extend(std::iter::repeat_n(empty, PROGRESS_BAR_WIDTH - filled));
    bar
}

/// Print a text section with a bold title and wrapped, indented content.
fn print_text_section<W: Write>(
    w: &mut W,
    title: &str,
    content: &str,
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    if config.use_colors {
        writeln!(w, "{}:", title.bold())?;
    } else {
        writeln!(w, "{title}:")?;
    }
    for line in wrap_text(content, width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }
    Ok(())
}

/// Wrap text to fit within a given width, preserving existing line breaks.
/// Uses textwrap to handle edge cases like long words (URLs, file paths).
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

// ============================================================================
// Text Formatting
// ============================================================================

fn attachment_badge(count: usize, config: &OutputConfig) -> String {
    if count == 0 {
        return String::new();
    }
    let icon = if config.use_ascii { "@" } else { "📎" };
    format!("  {}", magenta(&format!("{icon}{count}"), config))
}

fn print_issue_line<W: Write>(w: &mut W, issue: &Issue, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{} {}  {}  {}{}",
        colored_status_icon(issue.status, config),
        colorize_id(issue.id.as_str(), config),
        colorize_priority(issue.priority, config),
        issue.title,
        attachment_badge(issue.attachments.len(), config)
    )
}

fn print_issues_text<W: Write>(
    w: &mut W,
    issues: &[Issue],
    counts: &StatusCounts,
    config: &OutputConfig,
) -> io::Result<()> {
    if issues.is_empty() {
        writeln!(w, "No issues found.")?;
    } else {
        writeln!(w, "Found {} issue(s):", issues.len())?;
        writeln!(w)?;
        for issue in issues {
            print_issue_line(w, issue, config)?;
        }
    }

    writeln!(w)?;
    writeln!(
        w,
        "{} {} open, {} in progress, {} closed",
        dimmed("Summary:", config),
        counts.open,
        counts.in_progress,
        counts.closed
    )
}

fn print_issue_details_text<W: Write>(
    w: &mut W,
    issue: &Issue,
    config: &OutputConfig,
) -> io::Result<()> {
    let terminal_width = get_terminal_width();
    let content_width = terminal_width.min(config.max_width);

    writeln!(
        w,
        "{} {}: {}",
        colored_status_icon(issue.status, config),
        colorize_id(issue.id.as_str(), config),
        issue.title
    )?;

    writeln!(
        w,
        "{}  {}    {}  {}",
        dimmed("Status:", config),
        colorize_status(issue.status, config),
        dimmed("Priority:", config),
        colorize_priority(issue.priority, config)
    )?;

    writeln!(
        w,
        "{} {}    {} {}",
        dimmed("Created:", config),
        issue.created_at.format("%Y-%m-%d %H:%M"),
        dimmed("Updated:", config),
        issue.updated_at.format("%Y-%m-%d %H:%M")
    )?;

    print_text_section(w, "Description", &issue.description, content_width, config)?;

    if !issue.attachments.is_empty() {
        writeln!(w)?;
        writeln!(
            w,
            "{} ({}):",
            bold("Attachments", config),
            issue.attachments.len()
        )?;
        for file in &issue.attachments {
            print_file_line(w, file, config)?;
        }
    }

    Ok(())
}

fn print_file_line<W: Write>(
    w: &mut W,
    file: &FileMetadata,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "  {} {}  {}  {}",
        file_icon(&file.content_type, config),
        file.original_name,
        dimmed(&format_file_size(file.size), config),
        colorize_id(file.id.as_str(), config)
    )
}

fn print_files_text<W: Write>(
    w: &mut W,
    files: &[FileMetadata],
    config: &OutputConfig,
) -> io::Result<()> {
    if files.is_empty() {
        return writeln!(w, "No files attached.");
    }

    writeln!(w, "{} file(s):", files.len())?;
    for file in files {
        print_file_line(w, file, config)?;
        writeln!(
            w,
            "      {} {}  {}",
            dimmed("Uploaded:", config),
            file.uploaded_at.format("%Y-%m-%d %H:%M"),
            dimmed(&file.content_type, config)
        )?;
    }
    Ok(())
}

fn print_stats_text<W: Write>(
    w: &mut W,
    counts: &StatusCounts,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{}", bold("Issue Statistics", config))?;
    writeln!(w)?;
    writeln!(w, "  Total:        {}", counts.total)?;
    writeln!(
        w,
        "  {}         {}",
        colorize_status(crate::domain::IssueStatus::Open, config),
        counts.open
    )?;
    writeln!(
        w,
        "  {}  {}",
        colorize_status(crate::domain::IssueStatus::InProgress, config),
        counts.in_progress
    )?;
    writeln!(
        w,
        "  {}       {}",
        colorize_status(crate::domain::IssueStatus::Closed, config),
        counts.closed
    )
}

fn print_progress_text<W: Write>(
    w: &mut W,
    event: &UploadProgress,
    config: &OutputConfig,
) -> io::Result<()> {
    let icon = upload_status_icon(event.status, config);
    match (&event.status, &event.error) {
        (UploadStatus::Error, Some(message)) => {
            writeln!(w, "{icon} {}  {}", event.file_name, error(message, config))
        }
        _ => writeln!(
            w,
            "{icon} {}  {} {:>3.0}%",
            event.file_name,
            progress_bar(event.progress, config),
            event.progress
        ),
    }
}

fn print_upload_text<W: Write>(
    w: &mut W,
    uploaded: &[FileMetadata],
    config: &OutputConfig,
) -> io::Result<()> {
    if uploaded.is_empty() {
        return writeln!(w, "No files uploaded.");
    }
    writeln!(
        w,
        "{} {} file(s)",
        success("Uploaded", config),
        uploaded.len()
    )?;
    for file in uploaded {
        print_file_line(w, file, config)?;
    }
    Ok(())
}
