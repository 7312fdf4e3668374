//! Event type to handler dispatch.
//!
//! The router maps each decoded [`WebhookEvent`] to one of a fixed set of
//! handlers. Unknown types are accepted and ignored so that new sender-side
//! events never cause delivery failures.
//!
//! None of the built-in handlers integrate with anything yet; they report
//! [`HandlerOutcome::NotImplemented`] rather than pretending to succeed.
//! Real integrations are registered with the `with_*_handler` builders.

use crate::payload::{
    AiProcessingCompleteData, PaymentSuccessData, UserSignupData, WebhookEvent,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ============================================================================
// Outcomes and errors
// ============================================================================

/// What a handler did with an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum HandlerOutcome {
    /// The handler performed its integration work
    Handled { handler: String },

    /// The event reached a placeholder handler with no integration behind it
    NotImplemented { handler: String },

    /// The event type is unknown; nothing was done
    Ignored,
}

impl HandlerOutcome {
    /// Short label used in responses and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Handled { .. } => "handled",
            Self::NotImplemented { .. } => "not_implemented",
            Self::Ignored => "ignored",
        }
    }
}

/// Failure inside an event handler
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler '{handler}' failed: {message}")]
    Failed { handler: String, message: String },

    #[error("Handler '{handler}' dependency unavailable: {message}")]
    Unavailable { handler: String, message: String },
}

impl HandlerError {
    /// Check if the sender should retry the delivery
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

// ============================================================================
// Handler trait
// ============================================================================

/// Handler for one kind of event data
#[async_trait]
pub trait EventHandler<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Name used in logs and outcomes
    fn name(&self) -> &'static str;

    /// Process the event
    async fn handle(&self, data: &T) -> Result<HandlerOutcome, HandlerError>;
}

/// Placeholder handler that logs and reports [`HandlerOutcome::NotImplemented`]
#[derive(Debug, Clone, Copy)]
pub struct NotImplementedHandler {
    name: &'static str,
}

impl NotImplementedHandler {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl<T> EventHandler<T> for NotImplementedHandler
where
    T: Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, _data: &T) -> Result<HandlerOutcome, HandlerError> {
        warn!(handler = self.name, "Event handler not implemented; event recorded only");
        Ok(HandlerOutcome::NotImplemented {
            handler: self.name.to_string(),
        })
    }
}

// ============================================================================
// Router
// ============================================================================

/// Handler name for `payment.success`
pub const PAYMENT_SUCCESS_HANDLER: &str = "payment_success";
/// Handler name for `user.signup`
pub const USER_SIGNUP_HANDLER: &str = "user_signup";
/// Handler name for `ai.processing.complete`
pub const AI_PROCESSING_COMPLETE_HANDLER: &str = "ai_processing_complete";

/// Static dispatch table from event type to handler
#[derive(Clone)]
pub struct EventRouter {
    payment_success: Arc<dyn EventHandler<PaymentSuccessData>>,
    user_signup: Arc<dyn EventHandler<UserSignupData>>,
    ai_processing_complete: Arc<dyn EventHandler<AiProcessingCompleteData>>,
}

impl EventRouter {
    /// Router whose every handler is a [`NotImplementedHandler`]
    pub fn new() -> Self {
        Self {
            payment_success: Arc::new(NotImplementedHandler::new(PAYMENT_SUCCESS_HANDLER)),
            user_signup: Arc::new(NotImplementedHandler::new(USER_SIGNUP_HANDLER)),
            ai_processing_complete: Arc::new(NotImplementedHandler::new(
                AI_PROCESSING_COMPLETE_HANDLER,
            )),
        }
    }

    pub fn with_payment_handler(
        mut self,
        handler: Arc<dyn EventHandler<PaymentSuccessData>>,
    ) -> Self {
        self.payment_success = handler;
        self
    }

    pub fn with_signup_handler(mut self, handler: Arc<dyn EventHandler<UserSignupData>>) -> Self {
        self.user_signup = handler;
        self
    }

    pub fn with_ai_processing_handler(
        mut self,
        handler: Arc<dyn EventHandler<AiProcessingCompleteData>>,
    ) -> Self {
        self.ai_processing_complete = handler;
        self
    }

    /// Dispatch an event to its handler
    #[instrument(skip(self, event), fields(event_type = %event.event_type()))]
    pub async fn route(&self, event: &WebhookEvent) -> Result<HandlerOutcome, HandlerError> {
        let outcome = match event {
            WebhookEvent::PaymentSuccess(data) => self.payment_success.handle(data).await?,
            WebhookEvent::UserSignup(data) => self.user_signup.handle(data).await?,
            WebhookEvent::AiProcessingComplete(data) => {
                self.ai_processing_complete.handle(data).await?
            }
            WebhookEvent::Unknown { event_type, .. } => {
                info!(event_type = %event_type, "Unhandled webhook type; ignoring");
                HandlerOutcome::Ignored
            }
        };

        Ok(outcome)
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("payment_success", &self.payment_success.name())
            .field("user_signup", &self.user_signup.name())
            .field("ai_processing_complete", &self.ai_processing_complete.name())
            .finish()
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
