//! # Mirror Webhooks Core
//!
//! Core logic for the Mirror webhook receiver.
//!
//! This crate verifies inbound webhook signatures, records every accepted
//! delivery in an append-only audit log and routes the decoded event to a
//! handler chosen by its `type` field.
//!
//! ## Architecture
//!
//! - Business logic depends only on trait abstractions ([`audit_logging::AuditLogger`],
//!   [`router::EventHandler`])
//! - Storage backends live in [`adapters`] and are injected at runtime
//! - [`webhook::WebhookProcessor`] composes the pipeline
//!
//! ## Usage
//!
//! ```rust
//! use mirror_webhooks_core::signature::{sign_payload, is_valid_signature};
//!
//! let body = br#"{"type":"payment.success","data":{"amount":500}}"#;
//! let signature = sign_payload(body, "shared-secret").unwrap();
//! assert!(is_valid_signature(body, &signature, "shared-secret"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use ulid::Ulid;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Unique identifier for an audit record
///
/// Uses ULID so identifiers sort in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditRecordId(Ulid);

impl AuditRecordId {
    /// Generate a new unique record ID
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Get string representation of the record ID
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for AuditRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuditRecordId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = s.parse::<Ulid>().map_err(|_| ParseError::InvalidFormat {
            expected: "ULID format".to_string(),
            actual: s.to_string(),
        })?;
        Ok(Self(ulid))
    }
}

/// Name of a webhook event type, e.g. `payment.success`
///
/// Event types are free-form: unknown values are accepted so that new
/// sender-side events do not break delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    /// Create a new event type
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name under which deliveries of this type are written to the audit log
    pub fn audit_event_name(&self) -> String {
        format!("webhook.{}", self.0)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Time Types
// ============================================================================

/// UTC timestamp wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "RFC3339 datetime".to_string(),
                actual: s.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Classification of errors for monitoring and response mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failures that may succeed if the sender retries
    Transient,
    /// Permanent failures that won't succeed on retry
    Permanent,
    /// Authentication failures
    Security,
    /// Configuration errors preventing startup
    Configuration,
}

/// Error type for string parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

// ============================================================================
// Module declarations
// ============================================================================

/// HMAC-SHA256 webhook signature verification
pub mod signature;

/// Webhook payload envelope and typed event union
pub mod payload;

/// Append-only audit log interface
pub mod audit_logging;

/// Audit log backends
pub mod adapters;

/// Event type to handler dispatch
pub mod router;

/// Verify, log and route pipeline
pub mod webhook;

pub use webhook::{
    ProcessedWebhook, WebhookError, WebhookProcessor, WebhookProcessorImpl, WebhookRequest,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
