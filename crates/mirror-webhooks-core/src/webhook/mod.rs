//! # Webhook Processing Module
//!
//! Runs one delivery through the receiver pipeline:
//!
//! 1. Verify the `x-webhook-signature` header against the shared secret
//! 2. Parse the body as JSON
//! 3. Append an audit record holding the whole body
//! 4. Decode the typed event and route it to its handler
//!
//! A delivery that fails steps 1 or 2 leaves no audit record and reaches no
//! handler. Every delivery that gets past step 2 is recorded, even when its
//! `type` or `data` turns out to be unusable in step 4. Whether a failed
//! step 3 stops the pipeline is governed by [`AuditFailurePolicy`].

use crate::audit_logging::{AuditError, AuditFailurePolicy, AuditLogger, AuditRecord};
use crate::payload::{PayloadError, RawWebhookPayload, WebhookEvent};
use crate::router::{EventRouter, HandlerError, HandlerOutcome};
use crate::signature::{SignatureError, SignatureVerifier, VerificationOutcome};
use crate::{AuditRecordId, ErrorCategory, EventType, Timestamp};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

// ============================================================================
// Core Types
// ============================================================================

/// Raw delivery as received over HTTP
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub body: Bytes,
    pub signature: Option<String>,
    pub received_at: Timestamp,
}

impl WebhookRequest {
    /// Create a request stamped with the current time
    pub fn new(body: impl Into<Bytes>, signature: Option<String>) -> Self {
        Self {
            body: body.into(),
            signature,
            received_at: Timestamp::now(),
        }
    }

    /// Override the receive time
    pub fn with_received_at(mut self, received_at: Timestamp) -> Self {
        self.received_at = received_at;
        self
    }

    /// Signature header value, if present
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

/// Result of a delivery that made it through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedWebhook {
    pub event_type: EventType,

    /// Audit record written for this delivery.
    ///
    /// `None` only when the write failed under [`AuditFailurePolicy::FailOpen`].
    pub audit_id: Option<AuditRecordId>,

    pub outcome: HandlerOutcome,

    pub verification: VerificationOutcome,
}

impl ProcessedWebhook {
    /// Whether the delivery was routed without an audit record
    pub fn audit_skipped(&self) -> bool {
        self.audit_id.is_none()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that abort a delivery
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Signature validation failed: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("{0}")]
    MalformedPayload(#[from] PayloadError),

    #[error("Audit logging failed: {0}")]
    Audit(#[from] AuditError),

    #[error("Event handling failed: {0}")]
    Handler(#[from] HandlerError),
}

impl WebhookError {
    /// Check if the sender may succeed by retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidSignature(_) => false,
            Self::MalformedPayload(_) => false,
            Self::Audit(audit_error) => audit_error.is_transient(),
            Self::Handler(handler_error) => handler_error.is_transient(),
        }
    }

    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSignature(_) => ErrorCategory::Security,
            Self::MalformedPayload(_) => ErrorCategory::Permanent,
            Self::Audit(AuditError::ConfigurationError { .. }) => ErrorCategory::Configuration,
            Self::Audit(_) | Self::Handler(_) => {
                if self.is_transient() {
                    ErrorCategory::Transient
                } else {
                    ErrorCategory::Permanent
                }
            }
        }
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Main interface for the webhook pipeline
#[async_trait]
pub trait WebhookProcessor: Send + Sync {
    /// Process a delivery end to end
    async fn process_webhook(&self, request: WebhookRequest)
        -> Result<ProcessedWebhook, WebhookError>;

    /// Whether deliveries must be signed
    fn signature_required(&self) -> bool;
}

/// Default [`WebhookProcessor`] wiring a verifier, an audit log and a router
#[derive(Clone)]
pub struct WebhookProcessorImpl {
    verifier: SignatureVerifier,
    audit_logger: Arc<dyn AuditLogger>,
    router: EventRouter,
    failure_policy: AuditFailurePolicy,
}

impl WebhookProcessorImpl {
    /// Create a processor with the default router and fail-closed auditing
    pub fn new(verifier: SignatureVerifier, audit_logger: Arc<dyn AuditLogger>) -> Self {
        Self {
            verifier,
            audit_logger,
            router: EventRouter::new(),
            failure_policy: AuditFailurePolicy::default(),
        }
    }

    pub fn with_router(mut self, router: EventRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: AuditFailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Audit backend in use
    pub fn audit_logger(&self) -> &Arc<dyn AuditLogger> {
        &self.audit_logger
    }

    async fn record_audit(
        &self,
        payload: &RawWebhookPayload,
        received_at: Timestamp,
    ) -> Result<Option<AuditRecordId>, AuditError> {
        let record = AuditRecord::for_webhook(payload, received_at);

        match self.audit_logger.append(record).await {
            Ok(id) => Ok(Some(id)),
            Err(e) => match self.failure_policy {
                AuditFailurePolicy::FailClosed => {
                    error!(
                        backend = self.audit_logger.backend_name(),
                        error = %e,
                        "Audit write failed; rejecting delivery"
                    );
                    Err(e)
                }
                AuditFailurePolicy::FailOpen => {
                    error!(
                        backend = self.audit_logger.backend_name(),
                        error = %e,
                        "Audit write failed; continuing without audit record"
                    );
                    Ok(None)
                }
            },
        }
    }
}

impl std::fmt::Debug for WebhookProcessorImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookProcessorImpl")
            .field("verifier", &self.verifier)
            .field("audit_backend", &self.audit_logger.backend_name())
            .field("router", &self.router)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

#[async_trait]
impl WebhookProcessor for WebhookProcessorImpl {
    #[instrument(skip(self, request), fields(body_len = request.body.len()))]
    async fn process_webhook(
        &self,
        request: WebhookRequest,
    ) -> Result<ProcessedWebhook, WebhookError> {
        let verification = self
            .verifier
            .verify(&request.body, request.signature())
            .inspect_err(|e| warn!(error = %e, "Rejecting webhook with bad signature"))?;

        let payload = RawWebhookPayload::from_slice(&request.body)
            .inspect_err(|e| warn!(error = %e, "Rejecting webhook body that is not JSON"))?;

        let event_name = payload.audit_event_name();
        info!(event_name = %event_name, "Webhook received");

        let audit_id = self.record_audit(&payload, request.received_at).await?;
        let audit_ref = audit_id.map(|id| id.to_string()).unwrap_or_default();

        let event = WebhookEvent::from_raw(&payload).inspect_err(|e| {
            warn!(
                event_name = %event_name,
                audit_id = %audit_ref,
                error = %e,
                "Recorded webhook cannot be routed"
            )
        })?;
        let event_type = EventType::new(event.event_type());

        let outcome = self.router.route(&event).await.inspect_err(|e| {
            error!(event_type = %event_type, error = %e, "Event handler failed")
        })?;

        info!(
            event_type = %event_type,
            outcome = outcome.label(),
            audit_id = %audit_ref,
            "Webhook processed"
        );

        Ok(ProcessedWebhook {
            event_type,
            audit_id,
            outcome,
            verification,
        })
    }

    fn signature_required(&self) -> bool {
        self.verifier.is_enabled()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
