//! Error types for the HTTP service

use crate::config::MalformedPayloadStatus;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mirror_webhooks_core::signature::SignatureError;
use mirror_webhooks_core::WebhookError;
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// - `401 Unauthorized` (plain text): missing, malformed or mismatched signature
/// - `400 Bad Request`: body is not JSON, or its `type`/`data` cannot be
///   used. Deployments that must match older senders can switch this to `500`.
/// - `500 Internal Server Error`: audit write or handler failure
///
/// Every non-401 body has the shape `{"success": false, "error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Signature missing or not matching the shared secret
    #[error("{0}")]
    Unauthorized(SignatureError),

    /// Body could not be decoded
    #[error("{message}")]
    MalformedPayload {
        message: String,
        status: MalformedPayloadStatus,
    },

    /// Failure after the payload was accepted
    #[error("Processing failed: {0}")]
    ProcessingFailed(WebhookError),
}

impl WebhookHandlerError {
    /// Classify a pipeline error for the HTTP layer
    pub fn from_webhook_error(error: WebhookError, malformed_status: MalformedPayloadStatus) -> Self {
        match error {
            WebhookError::InvalidSignature(e) => Self::Unauthorized(e),
            WebhookError::MalformedPayload(e) => Self::MalformedPayload {
                message: e.to_string(),
                status: malformed_status,
            },
            other => Self::ProcessingFailed(other),
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::MalformedPayload { status, .. } => match status {
                MalformedPayloadStatus::BadRequest => StatusCode::BAD_REQUEST,
                MalformedPayloadStatus::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::ProcessingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label for the request outcome
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::MalformedPayload { .. } => "malformed",
            Self::ProcessingFailed(WebhookError::Audit(_)) => "audit_failed",
            Self::ProcessingFailed(WebhookError::Handler(_)) => "handler_failed",
            Self::ProcessingFailed(_) => "error",
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Unauthorized(e) => {
                warn!(error = %e, "Webhook signature rejected");
                let text = match e {
                    SignatureError::Missing => "Missing signature",
                    SignatureError::InvalidFormat => "Invalid signature format",
                    SignatureError::Mismatch | SignatureError::InvalidKey => "Invalid signature",
                };
                return (status, text).into_response();
            }
            Self::MalformedPayload { message, .. } => {
                warn!(error = %message, "Malformed webhook payload");
                message.clone()
            }
            Self::ProcessingFailed(e) => {
                error!(
                    error = %e,
                    category = ?e.error_category(),
                    transient = e.is_transient(),
                    "Webhook processing failed"
                );
                match e {
                    WebhookError::Audit(_) => "Failed to record webhook event".to_string(),
                    WebhookError::Handler(_) => "Failed to handle webhook event".to_string(),
                    _ => "Webhook processing failed".to_string(),
                }
            }
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {message}")]
    Load { message: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
