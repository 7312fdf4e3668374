//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use mirror_webhooks_core::audit_logging::AuditFailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhooks: WebhookConfig,

    /// Hosted database connection
    pub database: DatabaseConfig,

    /// Audit log settings
    pub audit: AuditConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for out-of-range values and
    /// [`ConfigError::Missing`] when the chosen audit backend lacks settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }

        if !self.webhooks.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhooks.endpoint_path must start with '/', got '{}'",
                    self.webhooks.endpoint_path
                ),
            });
        }

        match self.audit.backend {
            AuditBackend::Database => self.database.validate()?,
            AuditBackend::File => {
                if self.audit.file_path.is_none() {
                    return Err(ConfigError::Missing {
                        key: "audit.file_path".to_string(),
                    });
                }
            }
            AuditBackend::Memory | AuditBackend::Stdout => {}
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub enable_cors: bool,

    /// Enable compression
    pub enable_compression: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024, // 1MB
            enable_cors: false,
            enable_compression: true,
        }
    }
}

/// HTTP status used when the body is not a valid webhook payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPayloadStatus {
    /// 400 Bad Request
    #[default]
    BadRequest,

    /// 500 Internal Server Error, matching older deployments
    InternalError,
}

/// Webhook endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Shared HMAC secret. Unset or empty disables verification.
    pub secret: Option<String>,

    /// Response status for malformed payloads
    pub malformed_payload_status: MalformedPayloadStatus,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhook".to_string(),
            secret: None,
            malformed_payload_status: MalformedPayloadStatus::default(),
        }
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("endpoint_path", &self.endpoint_path)
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .field("malformed_payload_status", &self.malformed_payload_status)
            .finish()
    }
}

/// Hosted database connection used by the `database` audit backend
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Project base URL
    pub url: Option<String>,

    /// Privileged service key
    pub service_key: Option<String>,

    /// Table receiving audit rows
    pub table: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Parsed project URL
    pub fn parsed_url(&self) -> Result<url::Url, ConfigError> {
        let raw = self
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                key: "database.url".to_string(),
            })?;

        let parsed = url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
            message: format!("database.url is not a valid URL: {}", e),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(ConfigError::Invalid {
                message: format!("database.url must use http or https, got '{}'", other),
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_url()?;

        if self.service_key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing {
                key: "database.service_key".to_string(),
            });
        }

        if self.table.is_empty() {
            return Err(ConfigError::Invalid {
                message: "database.table must not be empty".to_string(),
            });
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "database.timeout_seconds must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            table: mirror_webhooks_core::adapters::rest_audit_log::DEFAULT_AUDIT_TABLE.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("service_key", &self.service_key.as_ref().map(|_| "<REDACTED>"))
            .field("table", &self.table)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Where audit records are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditBackend {
    /// Hosted database table over REST
    #[default]
    Database,

    /// JSON lines file
    File,

    /// Structured log events on stdout
    Stdout,

    /// Process memory; lost on restart
    Memory,
}

/// Audit log configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub backend: AuditBackend,

    /// Behaviour when an audit write fails
    pub failure_policy: AuditFailurePolicy,

    /// Target file for the `file` backend
    pub file_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
