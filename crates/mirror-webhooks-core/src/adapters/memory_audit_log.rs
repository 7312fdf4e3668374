//! # In-Memory Audit Logger
//!
//! Audit backend that keeps records in process memory. Intended for tests
//! and local development; records are lost on restart.

use crate::audit_logging::{AuditError, AuditLogger, AuditRecord};
use crate::AuditRecordId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// In-memory append-only audit log
///
/// Clones share the same underlying storage, so a test can keep a handle
/// while the service owns another.
///
/// ```rust
/// use mirror_webhooks_core::adapters::InMemoryAuditLogger;
/// use mirror_webhooks_core::audit_logging::{AuditLogger, AuditRecord};
/// use mirror_webhooks_core::payload::RawWebhookPayload;
/// use mirror_webhooks_core::Timestamp;
///
/// # tokio_test::block_on(async {
/// let log = InMemoryAuditLogger::new();
/// let payload = RawWebhookPayload::from_slice(br#"{"type":"user.signup","data":{}}"#).unwrap();
///
/// let handle = log.clone();
/// handle.append(AuditRecord::for_webhook(&payload, Timestamp::now())).await.unwrap();
///
/// assert_eq!(log.records()[0].event_name, "webhook.user.signup");
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLogger {
    records: Arc<RwLock<Vec<AuditRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryAuditLogger {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in insertion order
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of records written
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether no record has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make subsequent writes fail with a storage error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn append(&self, record: AuditRecord) -> Result<AuditRecordId, AuditError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuditError::StorageError {
                message: "in-memory audit log is configured to reject writes".to_string(),
            });
        }

        let id = record.id;
        let mut records = self.records.write().map_err(|_| AuditError::StorageError {
            message: "audit log lock poisoned".to_string(),
        })?;
        records.push(record);
        Ok(id)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn check_health(&self) -> Result<(), AuditError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuditError::ServiceUnavailable {
                service: "memory".to_string(),
                message: "writes disabled".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_audit_log_tests.rs"]
mod tests;
