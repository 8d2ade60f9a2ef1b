//! Webhook error types for Stripe webhook verification.
//!
//! Every variant is a verification failure of the inbound request. They all
//! map to `400 Bad Request` so that Stripe records the delivery as failed
//! without the relay doing anything else.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur while verifying an inbound webhook.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// The `Stripe-Signature` header is absent or empty.
    #[error("No stripe-signature header value was provided")]
    MissingHeader,

    /// No v1 signature matched the payload.
    #[error("No signatures found matching the expected signature for payload")]
    InvalidSignature,

    /// Webhook timestamp is older than the tolerance window.
    #[error("Timestamp outside the tolerance zone")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    ///
    /// A 4xx tells Stripe not to treat the failure as transient on our side;
    /// its own retry schedule still governs redelivery.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}
