//! Webhook payload envelope and typed event union.
//!
//! Deliveries are JSON, conventionally `{ "type": string, "data": any }`.
//! Decoding happens in two stages. [`RawWebhookPayload`] only requires the
//! body to be JSON and keeps it whole; this is what the audit log stores.
//! [`WebhookEvent`] then interprets `data` according to `type` for the
//! router, and its failures happen after the delivery has been recorded.

use crate::EventType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Event type for successful payments
pub const PAYMENT_SUCCESS: &str = "payment.success";

/// Event type for new user registrations
pub const USER_SIGNUP: &str = "user.signup";

/// Event type for finished AI processing jobs
pub const AI_PROCESSING_COMPLETE: &str = "ai.processing.complete";

/// Audit event name for a delivery without a string `type`
pub const UNTYPED_AUDIT_EVENT_NAME: &str = "webhook.untyped";

// ============================================================================
// Errors
// ============================================================================

/// Errors decoding a webhook body
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Malformed payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Malformed payload: 'type' must be a string")]
    MissingType,

    #[error("Malformed payload: data for '{event_type}' does not match its schema: {source}")]
    InvalidData {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PayloadError {
    /// Whether the body was rejected before anything was recorded
    pub fn is_unparseable(&self) -> bool {
        matches!(self, Self::InvalidJson(_))
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A delivery body that parsed as JSON, kept exactly as received
#[derive(Debug, Clone, PartialEq)]
pub struct RawWebhookPayload {
    body: Value,
    event_type: Option<EventType>,
}

impl RawWebhookPayload {
    /// Decode the raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InvalidJson`] only when the body is not JSON.
    /// A missing `type` is reported later, by [`WebhookEvent::from_raw`].
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        Ok(Self::from_value(serde_json::from_slice(body)?))
    }

    pub fn from_value(body: Value) -> Self {
        let event_type = body
            .get("type")
            .and_then(Value::as_str)
            .map(EventType::new);
        Self { body, event_type }
    }

    /// The `type` member, when it is a string
    pub fn event_type(&self) -> Option<&EventType> {
        self.event_type.as_ref()
    }

    /// The `data` member; `null` when absent
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }

    /// The whole body, including members other than `type` and `data`
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Audit log name of this delivery: `webhook.<type>`, or
    /// [`UNTYPED_AUDIT_EVENT_NAME`]
    pub fn audit_event_name(&self) -> String {
        match &self.event_type {
            Some(event_type) => event_type.audit_event_name(),
            None => UNTYPED_AUDIT_EVENT_NAME.to_string(),
        }
    }

    /// The payload as persisted in audit metadata
    pub fn to_value(&self) -> Value {
        self.body.clone()
    }
}

// ============================================================================
// Typed events
// ============================================================================

/// Data carried by a `payment.success` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSuccessData {
    #[serde(default)]
    pub amount: Option<Value>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Data carried by a `user.signup` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSignupData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Data carried by an `ai.processing.complete` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiProcessingCompleteData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts strings, numbers and booleans; senders disagree on id types.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, number or boolean, got {}",
            other
        ))),
    }
}

/// A webhook event with its data decoded according to its type
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    PaymentSuccess(PaymentSuccessData),
    UserSignup(UserSignupData),
    AiProcessingComplete(AiProcessingCompleteData),
    /// Any type this receiver does not know; accepted and ignored
    Unknown { event_type: EventType, data: Value },
}

impl WebhookEvent {
    /// Interpret the payload's `data` according to its `type`.
    ///
    /// Known types accept an object or `null` for `data`. Unknown types
    /// accept anything.
    ///
    /// # Errors
    ///
    /// [`PayloadError::MissingType`] when `type` is absent or not a string;
    /// [`PayloadError::InvalidData`] when a known type's `data` cannot be
    /// decoded.
    pub fn from_raw(raw: &RawWebhookPayload) -> Result<Self, PayloadError> {
        let event_type = raw.event_type().ok_or(PayloadError::MissingType)?;

        let event = match event_type.as_str() {
            PAYMENT_SUCCESS => Self::PaymentSuccess(decode_data(event_type, raw.data())?),
            USER_SIGNUP => Self::UserSignup(decode_data(event_type, raw.data())?),
            AI_PROCESSING_COMPLETE => {
                Self::AiProcessingComplete(decode_data(event_type, raw.data())?)
            }
            _ => Self::Unknown {
                event_type: event_type.clone(),
                data: raw.data().clone(),
            },
        };
        Ok(event)
    }

    /// Event type string this variant was decoded from
    pub fn event_type(&self) -> &str {
        match self {
            Self::PaymentSuccess(_) => PAYMENT_SUCCESS,
            Self::UserSignup(_) => USER_SIGNUP,
            Self::AiProcessingComplete(_) => AI_PROCESSING_COMPLETE,
            Self::Unknown { event_type, .. } => event_type.as_str(),
        }
    }

    /// Whether the router has a dedicated handler for this event
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown { .. })
    }
}

fn decode_data<T>(event_type: &EventType, data: &Value) -> Result<T, PayloadError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }

    T::deserialize(data).map_err(|source| PayloadError::InvalidData {
        event_type: event_type.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
