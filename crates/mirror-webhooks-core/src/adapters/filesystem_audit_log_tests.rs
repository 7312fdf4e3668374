//! Tests for the filesystem audit logger

use super::*;
use crate::payload::RawWebhookPayload;
use crate::Timestamp;
use std::sync::Arc;
use tempfile::TempDir;

fn record(event_type: &str) -> AuditRecord {
    let body = format!(r#"{{"type":"{}","data":{{"n":1}}}}"#, event_type);
    let payload = RawWebhookPayload::from_slice(body.as_bytes()).unwrap();
    AuditRecord::for_webhook(&payload, Timestamp::now())
}

async fn read_records(path: &Path) -> Vec<AuditRecord> {
    let content = tokio::fs::read_to_string(path).await.unwrap();
    content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("audit.jsonl");

    let _logger = FilesystemAuditLogger::new(path.clone()).await.unwrap();

    assert!(path.parent().unwrap().exists());
}

#[tokio::test]
async fn test_appends_one_line_per_record() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit.jsonl");
    let logger = FilesystemAuditLogger::new(path.clone()).await.unwrap();

    let first = record("payment.success");
    let second = record("user.signup");
    logger.append(first.clone()).await.unwrap();
    logger.append(second.clone()).await.unwrap();

    let stored = read_records(&path).await;
    assert_eq!(stored, vec![first, second]);
}

#[tokio::test]
async fn test_existing_content_is_never_truncated() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit.jsonl");

    let logger = FilesystemAuditLogger::new(path.clone()).await.unwrap();
    logger.append(record("a")).await.unwrap();
    drop(logger);

    let reopened = FilesystemAuditLogger::new(path.clone()).await.unwrap();
    reopened.append(record("b")).await.unwrap();

    let names: Vec<String> = read_records(&path)
        .await
        .into_iter()
        .map(|r| r.event_name)
        .collect();
    assert_eq!(names, vec!["webhook.a", "webhook.b"]);
}

#[tokio::test]
async fn test_concurrent_appends_produce_whole_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit.jsonl");
    let logger = Arc::new(FilesystemAuditLogger::new(path.clone()).await.unwrap());

    let mut tasks = Vec::new();
    for i in 0..20 {
        let logger = logger.clone();
        tasks.push(tokio::spawn(async move {
            logger.append(record(&format!("event.{}", i))).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(read_records(&path).await.len(), 20);
}

#[tokio::test]
async fn test_health_check_passes_for_existing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let logger = FilesystemAuditLogger::new(temp_dir.path().join("audit.jsonl"))
        .await
        .unwrap();

    assert!(logger.check_health().await.is_ok());
    assert_eq!(logger.backend_name(), "file");
}
