//! IssueStorage trait implementation for in-memory storage.

use super::InMemoryStorage;
use super::sorting::sort_by_recent_update;
use crate::domain::{
    FileId, FileMetadata, Issue, IssueFilter, IssueId, IssueUpdate, NewIssue, validate_title,
};
use crate::error::Result;
use crate::storage::IssueStorage;
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
impl IssueStorage for InMemoryStorage {
    async fn create(&mut self, new_issue: NewIssue) -> Result<Issue> {
        let mut inner = self.lock().await;

        new_issue.validate()?;

        let id = inner.generate_id()?;
        let now = inner.tick();

        let issue = Issue {
            id: id.clone(),
            title: new_issue.title,
            description: new_issue.description,
            status: new_issue.status,
            priority: new_issue.priority,
            created_at: now,
            updated_at: now,
            attachments: Vec::new(),
        };

        inner.issues.insert(id.clone(), issue.clone());
        debug!(issue_id = %id, "Created issue");

        Ok(issue)
    }

    async fn get(&self, id: &IssueId) -> Result<Option<Issue>> {
        let inner = self.lock().await;
        Ok(inner.issues.get(id).cloned())
    }

    async fn update(&mut self, id: &IssueId, updates: IssueUpdate) -> Result<Option<Issue>> {
        let mut inner = self.lock().await;

        if !inner.issues.contains_key(id) {
            return Ok(None);
        }

        // Validate before touching the record so a bad update changes nothing
        if let Some(title) = &updates.title {
            validate_title(title)?;
        }

        let now = inner.tick();
        let Some(issue) = inner.issues.get_mut(id) else {
            return Ok(None);
        };

        if let Some(title) = updates.title {
            issue.title = title;
        }
        if let Some(description) = updates.description {
            issue.description = description;
        }
        if let Some(status) = updates.status {
            issue.status = status;
        }
        if let Some(priority) = updates.priority {
            issue.priority = priority;
        }
        issue.updated_at = now;

        debug!(issue_id = %id, "Updated issue");
        Ok(Some(issue.clone()))
    }

    async fn delete(&mut self, id: &IssueId) -> Result<bool> {
        let mut inner = self.lock().await;
        let existed = inner.issues.remove(id).is_some();
        if existed {
            debug!(issue_id = %id, "Deleted issue");
        }
        Ok(existed)
    }

    async fn add_attachment(&mut self, id: &IssueId, attachment: FileMetadata) -> Result<bool> {
        let mut inner = self.lock().await;

        if !inner.issues.contains_key(id) {
            return Ok(false);
        }

        let now = inner.tick();
        let Some(issue) = inner.issues.get_mut(id) else {
            return Ok(false);
        };

        debug!(issue_id = %id, file_id = %attachment.id, "Attached file");
        issue.attachments.push(attachment);
        issue.updated_at = now;
        Ok(true)
    }

    async fn remove_attachment(&mut self, id: &IssueId, file_id: &FileId) -> Result<bool> {
        let mut inner = self.lock().await;

        let Some(index) = inner
            .issues
            .get(id)
            .and_then(|issue| issue.attachments.iter().position(|a| &a.id == file_id))
        else {
            return Ok(false);
        };

        let now = inner.tick();
        let Some(issue) = inner.issues.get_mut(id) else {
            return Ok(false);
        };

        issue.attachments.remove(index);
        issue.updated_at = now;
        debug!(issue_id = %id, %file_id, "Detached file");
        Ok(true)
    }

    async fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let inner = self.lock().await;

        let mut issues: Vec<Issue> = inner
            .issues
            .values()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect();

        sort_by_recent_update(&mut issues);

        if let Some(limit) = filter.limit {
            issues.truncate(limit);
        }

        Ok(issues)
    }

    async fn import_issues(&mut self, issues: Vec<Issue>) -> Result<()> {
        let mut inner = self.lock().await;

        for issue in issues {
            inner.register_id(&issue.id);
            inner.observe(issue.created_at);
            inner.observe(issue.updated_at);
            inner.issues.insert(issue.id.clone(), issue);
        }

        Ok(())
    }
}
