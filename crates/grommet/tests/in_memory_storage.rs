//! Integration tests for in-memory storage.
//!
//! These tests verify the full functionality of the in-memory storage backend,
//! including CRUD operations, attachments, filtering, ordering and the store
//! clock.

use chrono::{TimeZone, Utc};
use grommet::domain::{
    FileId, FileMetadata, Issue, IssueFilter, IssueId, IssueStatus, IssueUpdate, NewIssue,
    Priority,
};
use grommet::error::{Error, ValidationError};
use grommet::id_generation::validate_id;
use grommet::storage::IssueStorage;
use grommet::storage::in_memory::new_in_memory_storage;
use proptest::prelude::*;
use rstest::rstest;

fn create_test_issue(title: &str) -> NewIssue {
    NewIssue {
        title: title.to_string(),
        description: "Test description".to_string(),
        status: IssueStatus::Open,
        priority: Priority::Medium,
    }
}

fn create_test_issue_with(title: &str, status: IssueStatus, priority: Priority) -> NewIssue {
    NewIssue {
        status,
        priority,
        ..create_test_issue(title)
    }
}

fn attachment(id: &str, issue_id: &IssueId) -> FileMetadata {
    FileMetadata {
        id: FileId::new(id),
        filename: id.to_string(),
        original_name: format!("{id}.png"),
        size: 128,
        content_type: "image/png".to_string(),
        uploaded_at: Utc::now(),
        url: format!("https://bucket.test/{id}"),
        issue_id: issue_id.clone(),
    }
}

// ========== Basic CRUD Tests ==========

#[tokio::test]
async fn test_create_issue() {
    let mut storage = new_in_memory_storage("test".to_string());

    let issue = storage.create(create_test_issue("Test Issue")).await.unwrap();

    assert!(validate_id(issue.id.as_str(), "test"), "bad id {}", issue.id);
    assert_eq!(issue.title, "Test Issue");
    assert_eq!(issue.status, IssueStatus::Open);
    assert_eq!(issue.priority, Priority::Medium);
    assert_eq!(issue.created_at, issue.updated_at);
    assert!(issue.attachments.is_empty());
}

#[rstest]
#[case::empty("", ValidationError::EmptyTitle)]
#[case::blank("   ", ValidationError::EmptyTitle)]
#[case::too_long(&"x".repeat(201), ValidationError::TitleTooLong { length: 201, max: 200 })]
#[tokio::test]
async fn test_create_rejects_invalid_title(#[case] title: &str, #[case] expected: ValidationError) {
    let mut storage = new_in_memory_storage("test".to_string());

    let result = storage.create(create_test_issue(title)).await;

    match result {
        Err(Error::Validation(err)) => assert_eq!(err, expected),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(storage.list(&IssueFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ids_are_unique() {
    let mut storage = new_in_memory_storage("test".to_string());
    let mut ids = std::collections::HashSet::new();

    for i in 0..50 {
        let issue = storage
            .create(create_test_issue(&format!("Issue {i}")))
            .await
            .unwrap();
        assert!(ids.insert(issue.id));
    }
}

#[tokio::test]
async fn test_get_missing_issue() {
    let storage = new_in_memory_storage("test".to_string());
    let result = storage.get(&IssueId::new("test_0_missing00")).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_update_applies_only_given_fields() {
    let mut storage = new_in_memory_storage("test".to_string());
    let issue = storage.create(create_test_issue("Original")).await.unwrap();

    let updated = storage
        .update(
            &issue.id,
            IssueUpdate {
                status: Some(IssueStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Original");
    assert_eq!(updated.description, "Test description");
    assert_eq!(updated.status, IssueStatus::InProgress);
    assert_eq!(updated.created_at, issue.created_at);
    assert!(updated.updated_at > issue.updated_at);
}

#[tokio::test]
async fn test_update_with_invalid_title_changes_nothing() {
    let mut storage = new_in_memory_storage("test".to_string());
    let issue = storage.create(create_test_issue("Original")).await.unwrap();

    let result = storage
        .update(
            &issue.id,
            IssueUpdate {
                title: Some(String::new()),
                priority: Some(Priority::Urgent),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::EmptyTitle))
    ));
    let stored = storage.get(&issue.id).await.unwrap().unwrap();
    assert_eq!(stored, issue);
}

#[tokio::test]
async fn test_update_missing_issue() {
    let mut storage = new_in_memory_storage("test".to_string());
    let result = storage
        .update(
            &IssueId::new("test_missing"),
            IssueUpdate {
                title: Some("New".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let mut storage = new_in_memory_storage("test".to_string());
    let issue = storage.create(create_test_issue("Doomed")).await.unwrap();

    assert!(storage.delete(&issue.id).await.unwrap());
    assert!(!storage.delete(&issue.id).await.unwrap());
    assert!(storage.get(&issue.id).await.unwrap().is_none());
}

// ========== Attachment Tests ==========

#[tokio::test]
async fn test_attachments_keep_order_and_bump_updated_at() {
    let mut storage = new_in_memory_storage("test".to_string());
    let issue = storage.create(create_test_issue("With files")).await.unwrap();

    assert!(storage.add_attachment(&issue.id, attachment("file_a", &issue.id)).await.unwrap());
    assert!(storage.add_attachment(&issue.id, attachment("file_b", &issue.id)).await.unwrap());

    let stored = storage.get(&issue.id).await.unwrap().unwrap();
    let ids: Vec<&str> = stored.attachments.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["file_a", "file_b"]);
    assert!(stored.updated_at > issue.updated_at);
}

#[tokio::test]
async fn test_add_attachment_to_missing_issue() {
    let mut storage = new_in_memory_storage("test".to_string());
    let missing = IssueId::new("test_missing");
    assert!(!storage.add_attachment(&missing, attachment("file_a", &missing)).await.unwrap());
}

#[tokio::test]
async fn test_remove_attachment() {
    let mut storage = new_in_memory_storage("test".to_string());
    let issue = storage.create(create_test_issue("With files")).await.unwrap();
    storage.add_attachment(&issue.id, attachment("file_a", &issue.id)).await.unwrap();
    storage.add_attachment(&issue.id, attachment("file_b", &issue.id)).await.unwrap();
    let before = storage.get(&issue.id).await.unwrap().unwrap();

    assert!(storage.remove_attachment(&issue.id, &FileId::new("file_a")).await.unwrap());
    assert!(!storage.remove_attachment(&issue.id, &FileId::new("file_a")).await.unwrap());

    let after = storage.get(&issue.id).await.unwrap().unwrap();
    assert_eq!(after.attachments.len(), 1);
    assert_eq!(after.attachments[0].id.as_str(), "file_b");
    assert!(after.updated_at > before.updated_at);
}

// ========== Query Tests ==========

#[tokio::test]
async fn test_list_most_recently_updated_first() {
    let mut storage = new_in_memory_storage("test".to_string());
    let first = storage.create(create_test_issue("First")).await.unwrap();
    storage.create(create_test_issue("Second")).await.unwrap();
    storage.create(create_test_issue("Third")).await.unwrap();

    let titles = |issues: Vec<Issue>| issues.into_iter().map(|i| i.title).collect::<Vec<_>>();

    let listed = storage.list(&IssueFilter::default()).await.unwrap();
    assert_eq!(titles(listed), ["Third", "Second", "First"]);

    storage
        .update(
            &first.id,
            IssueUpdate {
                description: Some("touched".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let listed = storage.list(&IssueFilter::default()).await.unwrap();
    assert_eq!(titles(listed), ["First", "Third", "Second"]);
}

#[rstest]
#[case::by_status(
    IssueFilter { status: Some(IssueStatus::Closed), ..Default::default() },
    &["Closed low"]
)]
#[case::by_priority(
    IssueFilter { priority: Some(Priority::Urgent), ..Default::default() },
    &["Open urgent"]
)]
#[case::by_search(
    IssueFilter { search: Some("OPEN".to_string()), ..Default::default() },
    &["Open urgent", "Open medium"]
)]
#[case::combined(
    IssueFilter {
        status: Some(IssueStatus::Open),
        priority: Some(Priority::Medium),
        ..Default::default()
    },
    &["Open medium"]
)]
#[case::limit(IssueFilter { limit: Some(2), ..Default::default() }, &["Closed low", "Open urgent"])]
#[case::zero_limit(IssueFilter { limit: Some(0), ..Default::default() }, &[])]
#[tokio::test]
async fn test_list_filters(#[case] filter: IssueFilter, #[case] expected: &[&str]) {
    let mut storage = new_in_memory_storage("test".to_string());
    for new_issue in [
        create_test_issue_with("Open medium", IssueStatus::Open, Priority::Medium),
        create_test_issue_with("Open urgent", IssueStatus::Open, Priority::Urgent),
        create_test_issue_with("Closed low", IssueStatus::Closed, Priority::Low),
    ] {
        storage.create(new_issue).await.unwrap();
    }

    let issues = storage.list(&filter).await.unwrap();
    let titles: Vec<&str> = issues.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, expected);
}

#[tokio::test]
async fn test_list_ties_broken_by_id() {
    let mut storage = new_in_memory_storage("test".to_string());
    let at = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let imported: Vec<Issue> = ["test_b", "test_c", "test_a"]
        .into_iter()
        .map(|id| Issue {
            id: IssueId::new(id),
            title: id.to_string(),
            description: String::new(),
            status: IssueStatus::Open,
            priority: Priority::Low,
            created_at: at,
            updated_at: at,
            attachments: vec![],
        })
        .collect();
    storage.import_issues(imported).await.unwrap();

    let issues = storage.list(&IssueFilter::default()).await.unwrap();
    let ids: Vec<&str> = issues.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["test_a", "test_b", "test_c"]);
}

// ========== Import Tests ==========

#[tokio::test]
async fn test_import_keeps_ids_and_timestamps() {
    let mut storage = new_in_memory_storage("test".to_string());
    let created = Utc.with_ymd_and_hms(2024, 1, 14, 0, 0, 0).unwrap();
    let updated = Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap();
    let issue = Issue {
        id: IssueId::new("test_1705190400000_abcdefghi"),
        title: "Imported".to_string(),
        description: String::new(),
        status: IssueStatus::InProgress,
        priority: Priority::Urgent,
        created_at: created,
        updated_at: updated,
        attachments: vec![],
    };

    storage.import_issues(vec![issue.clone()]).await.unwrap();
    let fresh = storage.create(create_test_issue("Fresh")).await.unwrap();

    assert_eq!(storage.get(&issue.id).await.unwrap(), Some(issue.clone()));
    assert_ne!(fresh.id, issue.id);
    assert!(fresh.updated_at > updated);
}

// ========== Store Clock ==========

#[derive(Debug, Clone)]
enum Op {
    Create,
    Update(usize),
    Attach(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        (0usize..8).prop_map(Op::Update),
        (0usize..8).prop_map(Op::Attach),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_mutations_strictly_advance_updated_at(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        runtime.block_on(async {
            let mut storage = new_in_memory_storage("prop".to_string());
            let mut ids: Vec<IssueId> = Vec::new();
            let mut last = None;

            for (n, op) in ops.into_iter().enumerate() {
                let stamp = match op {
                    Op::Update(i) | Op::Attach(i) if !ids.is_empty() => {
                        let id = ids[i % ids.len()].clone();
                        if matches!(op, Op::Update(_)) {
                            storage
                                .update(&id, IssueUpdate { description: Some(n.to_string()), ..Default::default() })
                                .await
                                .unwrap()
                                .unwrap()
                                .updated_at
                        } else {
                            let file = attachment(&format!("file_{n}"), &id);
                            assert!(storage.add_attachment(&id, file).await.unwrap());
                            storage.get(&id).await.unwrap().unwrap().updated_at
                        }
                    }
                    _ => {
                        let issue = storage.create(create_test_issue(&format!("Issue {n}"))).await.unwrap();
                        ids.push(issue.id.clone());
                        issue.updated_at
                    }
                };

                if let Some(previous) = last {
                    assert!(stamp > previous, "{stamp} not after {previous}");
                }
                last = Some(stamp);
            }
        });
    }
}
