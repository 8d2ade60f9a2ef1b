//! Webhook domain - Verification and interpretation of Stripe events.
//!
//! Everything here is pure: signature checks, event parsing, classification
//! into a [`RelayPlan`] and idempotency key derivation. Outbound calls live
//! behind the `MembershipApi` port.

mod errors;
mod event;
mod idempotency;
mod plan;
mod verifier;

pub use errors::WebhookError;
pub use event::{CustomerDetails, EventKind, EventSubject, ExpandableId, StripeEvent, StripeEventData};
pub use idempotency::IdempotencyKey;
pub use plan::RelayPlan;
pub use verifier::{sign_payload, SignatureHeader, StripeWebhookVerifier};
