//! Response types for the API.

use mirror_webhooks_core::router::HandlerOutcome;
use mirror_webhooks_core::{AuditRecordId, EventType, ProcessedWebhook, Timestamp};
use serde::Serialize;
use std::collections::HashMap;

/// Webhook processing response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub outcome: &'static str,
    pub audit_id: Option<AuditRecordId>,
}

impl From<ProcessedWebhook> for WebhookResponse {
    fn from(processed: ProcessedWebhook) -> Self {
        let message = match &processed.outcome {
            HandlerOutcome::Handled { .. } => "Webhook processed",
            HandlerOutcome::NotImplemented { .. } => "Webhook recorded; handler not implemented",
            HandlerOutcome::Ignored => "Webhook recorded; event type not handled",
        };

        Self {
            success: true,
            message: message.to_string(),
            event_type: processed.event_type,
            outcome: processed.outcome.label(),
            audit_id: processed.audit_id,
        }
    }
}

/// Health check result for individual components
#[derive(Debug, Serialize, Clone)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub message: String,
    pub duration_ms: u64,
}

/// Overall health status
#[derive(Debug)]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub checks: HashMap<String, HealthCheckResult>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: Timestamp,
    pub checks: HashMap<String, HealthCheckResult>,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: Timestamp,
    pub checks: HashMap<String, HealthCheckResult>,
}
