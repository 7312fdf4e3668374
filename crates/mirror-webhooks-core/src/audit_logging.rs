//! Append-only audit log for accepted webhook deliveries.
//!
//! One [`AuditRecord`] is written for every delivery that passed signature
//! verification and decoded successfully, before any handler runs. Records
//! are never updated or deleted by this service.

use crate::payload::RawWebhookPayload;
use crate::{AuditRecordId, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Core Types
// ============================================================================

/// Immutable audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier, monotonic in insertion order
    pub id: AuditRecordId,

    /// `webhook.<type>`
    pub event_name: String,

    /// Delivery content and receipt time
    pub metadata: AuditMetadata,
}

/// Metadata stored with each audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    /// The decoded `{type, data}` envelope
    pub payload: serde_json::Value,

    /// When the delivery was received
    pub received_at: Timestamp,
}

impl AuditRecord {
    /// Build the audit record for a decoded delivery
    pub fn for_webhook(payload: &RawWebhookPayload, received_at: Timestamp) -> Self {
        Self {
            id: AuditRecordId::new(),
            event_name: payload.audit_event_name(),
            metadata: AuditMetadata {
                payload: payload.to_value(),
                received_at,
            },
        }
    }

    /// Row shape for the hosted database table: `{event_name, metadata}`
    pub fn to_row(&self) -> serde_json::Value {
        serde_json::json!({
            "event_name": self.event_name,
            "metadata": self.metadata,
        })
    }
}

/// What to do when the audit write fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFailurePolicy {
    /// Abort the request; the event is not routed
    #[default]
    FailClosed,

    /// Report the failure and continue routing
    FailOpen,
}

// ============================================================================
// Core Operations (Traits)
// ============================================================================

/// Interface for append-only audit storage
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Append one record
    async fn append(&self, record: AuditRecord) -> Result<AuditRecordId, AuditError>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Check whether the backend can currently accept writes
    async fn check_health(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while writing audit records
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    #[error("Service unavailable: {service} - {message}")]
    ServiceUnavailable { service: String, message: String },

    #[error("Request rejected by {service}: HTTP {status} - {message}")]
    Rejected {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Timeout during {operation} after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl AuditError {
    /// Check if error is transient
    pub fn is_transient(&self) -> bool {
        match self {
            AuditError::StorageError { .. }
            | AuditError::ServiceUnavailable { .. }
            | AuditError::Timeout { .. } => true,
            AuditError::Rejected { status, .. } => *status >= 500 || *status == 429,
            AuditError::SerializationError { .. } | AuditError::ConfigurationError { .. } => false,
        }
    }
}

#[cfg(test)]
#[path = "audit_logging_tests.rs"]
mod tests;
