//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands. Every
//! command runs against a shared [`App`] and prints through a [`Printer`],
//! so the same code serves one-shot invocations and interactive sessions.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use super::Commands;
use super::args::{
    AttachArgs, CreateArgs, DeleteArgs, DetachArgs, DownloadArgs, FilesArgs, ListArgs, ShowArgs,
    UpdateArgs,
};
use crate::app::App;
use crate::domain::{CandidateFile, FileId, IssueFilter, IssueId, IssueUpdate, NewIssue};
use crate::error::Error;
use crate::output::Printer;

/// Run one parsed command.
pub async fn run<W: Write>(app: &App, command: &Commands, printer: &mut Printer<W>) -> Result<()> {
    match command {
        Commands::Create(args) => execute_create(app, args, printer).await,
        Commands::List(args) => execute_list(app, args, printer).await,
        Commands::Show(args) => execute_show(app, args, printer).await,
        Commands::Update(args) => execute_update(app, args, printer).await,
        Commands::Delete(args) => execute_delete(app, args, printer).await,
        Commands::Attach(args) => execute_attach(app, args, printer).await,
        Commands::Detach(args) => execute_detach(app, args, printer).await,
        Commands::Download(args) => execute_download(app, args, printer).await,
        Commands::Files(args) => execute_files(app, args, printer).await,
        Commands::Stats(_) => execute_stats(app, printer).await,
    }
}

/// Execute the create command
pub async fn execute_create<W: Write>(
    app: &App,
    args: &CreateArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let issue = app
        .create_issue(NewIssue {
            title: args.title.clone(),
            description: args.description.clone(),
            status: args.status.into(),
            priority: args.priority.into(),
        })
        .await?;

    printer.message(&format!("Created issue: {}", issue.id), &issue)?;
    Ok(())
}

/// Execute the list command
pub async fn execute_list<W: Write>(
    app: &App,
    args: &ListArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let filter = IssueFilter {
        status: args.status.map(Into::into),
        priority: args.priority.map(Into::into),
        search: args.search.clone(),
        limit: args.limit,
    };

    let issues = app.list_issues(&filter).await?;
    let counts = app.status_counts().await?;
    printer.issues(&issues, &counts)?;
    Ok(())
}

/// Execute the show command
pub async fn execute_show<W: Write>(
    app: &App,
    args: &ShowArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    for (i, id) in args.issue_ids.iter().enumerate() {
        let issue_id = IssueId::new(id);
        let issue = app
            .get_issue(&issue_id)
            .await?
            .ok_or(Error::IssueNotFound(issue_id))?;

        if i > 0 {
            printer.line("")?;
        }
        printer.issue_details(&issue)?;
    }
    Ok(())
}

/// Execute the update command
pub async fn execute_update<W: Write>(
    app: &App,
    args: &UpdateArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let updates = IssueUpdate {
        title: args.title.clone(),
        description: args.description.clone(),
        status: args.status.map(Into::into),
        priority: args.priority.map(Into::into),
    };

    if updates.is_empty() {
        anyhow::bail!(
            "No updates specified. Use --title, --description, --status or --priority"
        );
    }

    let issue_id = IssueId::new(&args.issue_id);
    let issue = app
        .update_issue(&issue_id, updates)
        .await?
        .ok_or(Error::IssueNotFound(issue_id))?;

    printer.message(&format!("Updated issue: {}", issue.id), &issue)?;
    Ok(())
}

/// Execute the delete command
pub async fn execute_delete<W: Write>(
    app: &App,
    args: &DeleteArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let issue_id = IssueId::new(&args.issue_id);
    if !app.delete_issue(&issue_id).await? {
        return Err(Error::IssueNotFound(issue_id).into());
    }

    printer.message(
        &format!("Deleted issue: {issue_id}"),
        &serde_json::json!({ "deleted": issue_id, "status": "success" }),
    )?;
    Ok(())
}

/// Execute the attach command.
///
/// Files are read up front, then uploaded as one batch while progress
/// events are printed as they arrive.
pub async fn execute_attach<W: Write>(
    app: &App,
    args: &AttachArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let issue_id = IssueId::new(&args.issue_id);

    let mut files = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        files.push(read_candidate(path, args.content_type.as_deref()).await?);
    }

    let (events, mut received) = mpsc::unbounded_channel();
    let upload = app.upload_files(&issue_id, files, Some(events));
    let relay = async {
        while let Some(event) = received.recv().await {
            printer.progress(&event)?;
        }
        Ok::<_, std::io::Error>(())
    };
    let (result, relayed) = tokio::join!(upload, relay);
    relayed?;

    let uploaded = result?;
    printer.upload_result(&uploaded)?;
    Ok(())
}

/// Load a file from disk as an upload candidate.
async fn read_candidate(path: &Path, content_type: Option<&str>) -> Result<CandidateFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    let content_type = content_type.map_or_else(|| guess_content_type(path), str::to_string);

    Ok(CandidateFile::new(name, content_type, data))
}

/// MIME type for a path, from its extension.
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Execute the detach command
pub async fn execute_detach<W: Write>(
    app: &App,
    args: &DetachArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let issue_id = IssueId::new(&args.issue_id);
    let file_id = FileId::new(&args.file_id);

    if !app.delete_attachment(&issue_id, &file_id).await? {
        anyhow::bail!("File {file_id} is not attached to {issue_id}");
    }

    printer.message(
        &format!("Removed {file_id} from {issue_id}"),
        &serde_json::json!({ "issueId": issue_id, "removed": file_id }),
    )?;
    Ok(())
}

/// Execute the download command
pub async fn execute_download<W: Write>(
    app: &App,
    args: &DownloadArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let file_id = FileId::new(&args.file_id);
    let metadata = app
        .registry()
        .get(&file_id)
        .await
        .ok_or_else(|| Error::FileNotFound(file_id.clone()))?;
    let data = app.download_file(&file_id).await?;

    let destination = args
        .output
        .clone()
        .unwrap_or_else(|| default_download_path(&metadata.original_name, &file_id));
    tokio::fs::write(&destination, &data)
        .await
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    printer.message(
        &format!(
            "Saved {} ({} bytes) to {}",
            metadata.original_name,
            data.len(),
            destination.display()
        ),
        &serde_json::json!({
            "fileId": file_id,
            "path": destination.display().to_string(),
            "size": data.len(),
        }),
    )?;
    Ok(())
}

/// The original name, stripped of any directory components.
fn default_download_path(original_name: &str, file_id: &FileId) -> PathBuf {
    Path::new(original_name)
        .file_name()
        .map_or_else(|| PathBuf::from(file_id.as_str()), PathBuf::from)
}

/// Execute the files command
pub async fn execute_files<W: Write>(
    app: &App,
    args: &FilesArgs,
    printer: &mut Printer<W>,
) -> Result<()> {
    let issue_id = IssueId::new(&args.issue_id);
    if app.get_issue(&issue_id).await?.is_none() {
        return Err(Error::IssueNotFound(issue_id).into());
    }

    let files = app.files_for_issue(&issue_id).await;
    printer.files(&files)?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats<W: Write>(app: &App, printer: &mut Printer<W>) -> Result<()> {
    let counts = app.status_counts().await?;
    printer.stats(&counts)?;
    Ok(())
}
