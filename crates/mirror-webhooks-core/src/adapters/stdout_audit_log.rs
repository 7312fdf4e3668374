//! # Stdout Audit Logger
//!
//! Writes each audit record as one JSON line to standard output, for
//! container deployments where a log collector ships stdout to durable
//! storage. Records bypass the `tracing` subscriber, so log level filters
//! never drop them.

use crate::audit_logging::{AuditError, AuditLogger, AuditRecord};
use crate::AuditRecordId;
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;
use tracing::debug;

/// Audit logger writing JSON lines to stdout or another sink
pub struct StdoutAuditLogger {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StdoutAuditLogger {
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }

    /// Write records to `writer` instead of stdout
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl Default for StdoutAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StdoutAuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutAuditLogger").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuditLogger for StdoutAuditLogger {
    async fn append(&self, record: AuditRecord) -> Result<AuditRecordId, AuditError> {
        let mut line = serde_json::to_vec(&record).map_err(|e| AuditError::SerializationError {
            message: e.to_string(),
        })?;
        line.push(b'\n');

        let mut writer = self.writer.lock().map_err(|_| AuditError::StorageError {
            message: "stdout audit writer lock poisoned".to_string(),
        })?;

        // One write per record keeps lines whole.
        writer
            .write_all(&line)
            .and_then(|_| writer.flush())
            .map_err(|e| AuditError::StorageError {
                message: format!("Failed to write audit record to stdout: {}", e),
            })?;

        debug!(audit_id = %record.id, event_name = %record.event_name, "Audit record written");
        Ok(record.id)
    }

    fn backend_name(&self) -> &'static str {
        "stdout"
    }
}

#[cfg(test)]
#[path = "stdout_audit_log_tests.rs"]
mod tests;
