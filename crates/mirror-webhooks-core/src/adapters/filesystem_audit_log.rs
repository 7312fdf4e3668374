//! # Filesystem Audit Logger
//!
//! Appends audit records to a local file, one JSON document per line.

use crate::audit_logging::{AuditError, AuditLogger, AuditRecord};
use crate::AuditRecordId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// JSON-lines audit log on the local filesystem
///
/// # Examples
///
/// ```no_run
/// use mirror_webhooks_core::adapters::FilesystemAuditLogger;
/// use std::path::PathBuf;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let logger = FilesystemAuditLogger::new(PathBuf::from("./data/audit.jsonl")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FilesystemAuditLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilesystemAuditLogger {
    /// Create a logger writing to `path`
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created.
    pub async fn new(path: PathBuf) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AuditError::StorageError {
                    message: format!("Failed to create audit log directory: {}", e),
                })?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditLogger for FilesystemAuditLogger {
    async fn append(&self, record: AuditRecord) -> Result<AuditRecordId, AuditError> {
        let mut line =
            serde_json::to_string(&record).map_err(|e| AuditError::SerializationError {
                message: e.to_string(),
            })?;
        line.push('\n');

        // Whole-line writes under the lock keep concurrent records from interleaving.
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AuditError::StorageError {
                message: format!("Failed to open audit log: {}", e),
            })?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AuditError::StorageError {
                message: format!("Failed to write audit record: {}", e),
            })?;

        file.flush().await.map_err(|e| AuditError::StorageError {
            message: format!("Failed to flush audit log: {}", e),
        })?;

        debug!(audit_id = %record.id, path = %self.path.display(), "Audit record appended");
        Ok(record.id)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn check_health(&self) -> Result<(), AuditError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        fs::metadata(dir)
            .await
            .map(|_| ())
            .map_err(|e| AuditError::ServiceUnavailable {
                service: "file".to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "filesystem_audit_log_tests.rs"]
mod tests;
