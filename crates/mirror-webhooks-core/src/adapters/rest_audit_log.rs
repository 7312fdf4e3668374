//! # Database REST Audit Logger
//!
//! Inserts audit records into a hosted Postgres table through its REST
//! gateway (`POST {database_url}/rest/v1/{table}`), authenticated with the
//! privileged service key.

use crate::audit_logging::{AuditError, AuditLogger, AuditRecord};
use crate::AuditRecordId;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;
use zeroize::Zeroizing;

const SERVICE_NAME: &str = "database";

/// Default table receiving webhook audit rows
pub const DEFAULT_AUDIT_TABLE: &str = "analytics_events";

/// Connection settings for [`RestAuditLogger`]
#[derive(Clone)]
pub struct RestAuditLoggerConfig {
    /// Base URL of the hosted database project
    pub database_url: Url,

    /// Privileged access key
    pub service_key: Zeroizing<String>,

    /// Table receiving audit rows
    pub table: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl RestAuditLoggerConfig {
    /// Settings with the default table and a 10 second timeout
    pub fn new(database_url: Url, service_key: impl Into<String>) -> Self {
        Self {
            database_url,
            service_key: Zeroizing::new(service_key.into()),
            table: DEFAULT_AUDIT_TABLE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint rows are inserted into
    pub fn insert_url(&self) -> Result<Url, AuditError> {
        let base = self.database_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/rest/v1/{}", base, self.table)).map_err(|e| {
            AuditError::ConfigurationError {
                message: format!("Invalid audit table endpoint: {}", e),
            }
        })
    }
}

impl std::fmt::Debug for RestAuditLoggerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAuditLoggerConfig")
            .field("database_url", &self.database_url.as_str())
            .field("service_key", &"<REDACTED>")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Audit logger backed by the hosted database REST gateway
#[derive(Debug, Clone)]
pub struct RestAuditLogger {
    config: RestAuditLoggerConfig,
    insert_url: Url,
    http_client: reqwest::Client,
}

impl RestAuditLogger {
    /// Build a logger and its HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ConfigurationError`] if the endpoint URL cannot be
    /// formed or the HTTP client cannot be built.
    pub fn new(config: RestAuditLoggerConfig) -> Result<Self, AuditError> {
        let insert_url = config.insert_url()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mirror-webhooks/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuditError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            insert_url,
            http_client,
        })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> AuditError {
        if error.is_timeout() {
            AuditError::Timeout {
                operation: "audit insert".to_string(),
                duration: self.config.timeout,
            }
        } else if error.is_connect() {
            AuditError::ServiceUnavailable {
                service: SERVICE_NAME.to_string(),
                message: error.to_string(),
            }
        } else {
            AuditError::StorageError {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl AuditLogger for RestAuditLogger {
    #[instrument(skip(self, record), fields(audit_id = %record.id, event_name = %record.event_name))]
    async fn append(&self, record: AuditRecord) -> Result<AuditRecordId, AuditError> {
        let key = self.config.service_key.as_str();

        let response = self
            .http_client
            .post(self.insert_url.clone())
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=minimal")
            .json(&record.to_row())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(512).collect();
            warn!(status = status.as_u16(), "Audit insert rejected by database");
            return Err(AuditError::Rejected {
                service: SERVICE_NAME.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "Audit record inserted");
        Ok(record.id)
    }

    fn backend_name(&self) -> &'static str {
        SERVICE_NAME
    }
}

#[cfg(test)]
#[path = "rest_audit_log_tests.rs"]
mod tests;
