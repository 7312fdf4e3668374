//! Audit backend selection.

use mirror_webhooks_api::{AuditBackend, ConfigError, ServiceConfig};
use mirror_webhooks_core::adapters::{
    FilesystemAuditLogger, InMemoryAuditLogger, RestAuditLogger, RestAuditLoggerConfig,
    StdoutAuditLogger,
};
use mirror_webhooks_core::audit_logging::AuditLogger;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Construct the audit logger named by `audit.backend`
pub async fn build_audit_logger(
    config: &ServiceConfig,
) -> Result<Arc<dyn AuditLogger>, ConfigError> {
    let logger: Arc<dyn AuditLogger> = match config.audit.backend {
        AuditBackend::Database => {
            let database = &config.database;
            let service_key = database
                .service_key
                .clone()
                .ok_or_else(|| ConfigError::Missing {
                    key: "database.service_key".to_string(),
                })?;

            let rest_config = RestAuditLoggerConfig::new(database.parsed_url()?, service_key)
                .with_table(database.table.clone())
                .with_timeout(Duration::from_secs(database.timeout_seconds));

            Arc::new(RestAuditLogger::new(rest_config).map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })?)
        }
        AuditBackend::File => {
            let path = config
                .audit
                .file_path
                .clone()
                .ok_or_else(|| ConfigError::Missing {
                    key: "audit.file_path".to_string(),
                })?;

            Arc::new(FilesystemAuditLogger::new(path).await.map_err(|e| {
                ConfigError::Invalid {
                    message: format!("Cannot open audit file: {}", e),
                }
            })?)
        }
        AuditBackend::Stdout => Arc::new(StdoutAuditLogger::new()),
        AuditBackend::Memory => {
            warn!("Using in-memory audit log; records are lost on restart");
            Arc::new(InMemoryAuditLogger::new())
        }
    };

    info!(
        backend = logger.backend_name(),
        failure_policy = ?config.audit.failure_policy,
        "Audit logger ready"
    );
    Ok(logger)
}

#[cfg(test)]
#[path = "audit_backend_tests.rs"]
mod tests;
