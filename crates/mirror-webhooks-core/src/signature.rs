//! HMAC-SHA256 webhook signature verification.
//!
//! Senders sign the raw request body with a shared secret and transmit the
//! result in the `x-webhook-signature` header as `sha256=<lowercase hex>`.
//! The receiver recomputes the digest over the exact bytes it received and
//! compares the two hex strings in constant time.
//!
//! When no secret is configured the receiver runs unauthenticated and
//! [`SignatureVerifier::verify`] reports [`VerificationOutcome::Skipped`].

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, instrument, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// HTTP header carrying the signature
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Required prefix of every signature value
pub const SIGNATURE_PREFIX: &str = "sha256=";

// ============================================================================
// Errors
// ============================================================================

/// Reasons a delivery fails authentication
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// A secret is configured but the request carried no signature
    #[error("Missing signature")]
    Missing,

    /// The signature does not start with `sha256=`
    #[error("Invalid signature format")]
    InvalidFormat,

    /// The digest does not match the body
    #[error("Invalid signature")]
    Mismatch,

    /// The secret cannot be used as an HMAC key
    #[error("Webhook secret cannot be used as HMAC key")]
    InvalidKey,
}

// ============================================================================
// Secret
// ============================================================================

/// Shared webhook secret
///
/// The backing memory is zeroed on drop and the value never appears in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret for HMAC computation
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<REDACTED>)")
    }
}

// ============================================================================
// Pure functions
// ============================================================================

/// Compute the lowercase hex HMAC-SHA256 digest of `body` keyed by `secret`.
pub fn compute_digest_hex(body: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Produce a `sha256=<hex>` signature for `body`.
///
/// # Examples
///
/// ```rust
/// use mirror_webhooks_core::signature::sign_payload;
///
/// let signature = sign_payload(b"{}", "secret").unwrap();
/// assert!(signature.starts_with("sha256="));
/// assert_eq!(signature.len(), "sha256=".len() + 64);
/// ```
pub fn sign_payload(body: &[u8], secret: &str) -> Result<String, SignatureError> {
    Ok(format!("{}{}", SIGNATURE_PREFIX, compute_digest_hex(body, secret)?))
}

/// Verify `signature` against `body` using `secret`.
///
/// # Errors
///
/// - [`SignatureError::InvalidFormat`] when the `sha256=` prefix is absent
/// - [`SignatureError::Mismatch`] when the digest differs from the computed one
pub fn verify_signature(body: &[u8], signature: &str, secret: &str) -> Result<(), SignatureError> {
    let supplied = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::InvalidFormat)?;

    let expected = compute_digest_hex(body, secret)?;

    if constant_time_eq(expected.as_bytes(), supplied.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Boolean form of [`verify_signature`].
pub fn is_valid_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    verify_signature(body, signature, secret).is_ok()
}

/// Compare two byte strings without short-circuiting on the first difference.
///
/// Lengths are compared first; the digest length is public so this leaks
/// nothing about the secret-derived content.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

// ============================================================================
// Verifier
// ============================================================================

/// Result of a successful verification step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The signature matched the configured secret
    Verified,
    /// No secret is configured; the delivery was not authenticated
    Skipped,
}

/// Signature verifier bound to an optional shared secret
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: Option<WebhookSecret>,
}

impl SignatureVerifier {
    /// Create a verifier.
    ///
    /// An empty secret string is treated the same as no secret.
    pub fn new(secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.is_empty()).map(WebhookSecret::new);
        if secret.is_none() {
            warn!("No webhook secret configured; signature verification is disabled");
        }
        Self { secret }
    }

    /// Verifier that accepts every delivery
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    /// Whether deliveries must carry a valid signature
    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Check the signature header of a delivery.
    #[instrument(skip(self, body, signature), fields(has_signature = signature.is_some()))]
    pub fn verify(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<VerificationOutcome, SignatureError> {
        let Some(secret) = &self.secret else {
            debug!("Signature verification skipped - no secret configured");
            return Ok(VerificationOutcome::Skipped);
        };

        let signature = signature.ok_or(SignatureError::Missing)?;
        verify_signature(body, signature, secret.expose())?;

        debug!("Webhook signature verified");
        Ok(VerificationOutcome::Verified)
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
