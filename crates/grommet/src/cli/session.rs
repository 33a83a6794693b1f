//! Interactive sessions.
//!
//! Without a subcommand the binary reads commands line by line, from stdin
//! or a script file, and runs each one against the same in-memory [`App`].
//! A failing command prints its error and the session continues.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::{Commands, execute};
use crate::app::App;
use crate::output::Printer;

/// Prompt printed before each line when the session is interactive
pub const PROMPT: &str = "grommet> ";

/// One session line, parsed with the same subcommands as the binary.
#[derive(Parser, Debug)]
#[command(name = "grommet", no_binary_name = true, disable_version_flag = true)]
#[command(disable_help_subcommand = true)]
struct SessionLine {
    #[command(subcommand)]
    command: Commands,
}

/// A line that cannot be split into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A double quote was opened but never closed.
    #[error("Unterminated quote starting at column {0}")]
    UnterminatedQuote(usize),
}

/// Split a line into words.
///
/// Words are separated by whitespace. Double quotes group words, and inside
/// quotes `\"` and `\\` stand for a literal quote and backslash.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars().enumerate().peekable();

    while let Some((column, c)) = chars.next() {
        match c {
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) if matches!(chars.peek(), Some((_, '"' | '\\'))) => {
                            if let Some((_, escaped)) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        Some((_, other)) => current.push(other),
                        None => return Err(TokenizeError::UnterminatedQuote(column + 1)),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Outcome of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Commands that ran (successfully or not)
    pub executed: usize,
    /// Commands that failed to parse or run
    pub failed: usize,
}

/// Session help, listing the commands.
pub fn help_text() -> String {
    let mut command = SessionLine::command();
    let mut help = command.render_help().to_string();
    help.push_str("\nSession: `help` prints this text, `exit` or `quit` ends the session.\n");
    help
}

/// Read and run commands until the input ends or `exit`/`quit` is read.
pub async fn run_session<R, W>(
    app: &App,
    input: R,
    printer: &mut Printer<W>,
    prompt: bool,
) -> Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut summary = SessionSummary::default();

    loop {
        if prompt {
            printer.prompt(PROMPT)?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let words = match tokenize(line) {
            Ok(words) => words,
            Err(e) => {
                summary.failed += 1;
                printer.failure(&e.to_string())?;
                continue;
            }
        };

        match words.first().map(String::as_str) {
            Some("exit" | "quit") => break,
            Some("help") if words.len() == 1 => {
                printer.line(help_text().trim_end())?;
                continue;
            }
            _ => {}
        }

        summary.executed += 1;
        debug!(line, "Running session command");
        let parsed = match SessionLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) => {
                if !matches!(e.kind(), clap::error::ErrorKind::DisplayHelp) {
                    summary.failed += 1;
                }
                printer.line(e.render().to_string().trim_end())?;
                continue;
            }
        };

        if let Err(e) = execute::run(app, &parsed.command, printer).await {
            summary.failed += 1;
            printer.failure(&format!("{e:#}"))?;
        }
    }

    printer.flush()?;
    Ok(summary)
}
