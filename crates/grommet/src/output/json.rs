//! JSON output.

use crate::domain::{FileMetadata, Issue, StatusCounts};
use serde::Serialize;
use std::io::{self, Write};

fn write_pretty<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

pub(super) fn print_issue_json<W: Write>(w: &mut W, issue: &Issue) -> io::Result<()> {
    write_pretty(w, issue)
}

pub(super) fn print_issues_json<W: Write>(w: &mut W, issues: &[Issue]) -> io::Result<()> {
    write_pretty(w, issues)
}

pub(super) fn print_files_json<W: Write>(w: &mut W, files: &[FileMetadata]) -> io::Result<()> {
    write_pretty(w, files)
}

pub(super) fn print_stats_json<W: Write>(w: &mut W, counts: &StatusCounts) -> io::Result<()> {
    write_pretty(
        w,
        &serde_json::json!({
            "total": counts.total,
            "open": counts.open,
            "inProgress": counts.in_progress,
            "closed": counts.closed,
        }),
    )
}

pub(super) fn print_value_json<W: Write, T: Serialize + ?Sized>(
    w: &mut W,
    value: &T,
) -> io::Result<()> {
    write_pretty(w, value)
}
