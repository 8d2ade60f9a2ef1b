//! Stripe webhook event types.
//!
//! Defines the structures for parsing Stripe webhook payloads.
//! Only fields relevant to relaying access changes are captured; the
//! same subject shape is used for checkout sessions, invoices, payment
//! intents and subscriptions, since each populates a different subset.

use serde::{Deserialize, Serialize};

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    #[serde(default)]
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// Object containing event-specific data.
    pub data: StripeEventData,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event.
    pub object: EventSubject,
}

/// The object an event is about.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventSubject {
    /// Object identifier (cs_, in_, pi_, sub_ ...).
    #[serde(default)]
    pub id: Option<String>,

    /// Stripe object type name, kept for logging.
    #[serde(default)]
    pub object: Option<String>,

    /// Email set directly on checkout sessions and invoices.
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Details collected during checkout.
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,

    /// Receipt email on payment intents and charges.
    #[serde(default)]
    pub receipt_email: Option<String>,

    /// Subscription the object belongs to, if any.
    #[serde(default)]
    pub subscription: Option<ExpandableId>,
}

/// Customer details block of a checkout session.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

/// A reference Stripe may send either as a bare id or as an expanded object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExpandableId {
    Id(String),
    Object { id: String },
}

impl ExpandableId {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl EventSubject {
    /// Resolves the purchaser's email.
    ///
    /// Precedence: `customer_email`, then `customer_details.email`, then
    /// `receipt_email`. Blank values are skipped.
    pub fn email(&self) -> Option<&str> {
        non_empty(self.customer_email.as_deref())
            .or_else(|| {
                non_empty(
                    self.customer_details
                        .as_ref()
                        .and_then(|details| details.email.as_deref()),
                )
            })
            .or_else(|| non_empty(self.receipt_email.as_deref()))
    }

    /// The correlation key sent to the membership API.
    ///
    /// The subscription id when the subject belongs to one, otherwise the
    /// subject's own id. Both are stable across redeliveries of an event.
    pub fn external_reference(&self) -> Option<&str> {
        non_empty(self.subscription.as_ref().map(ExpandableId::id))
            .or_else(|| non_empty(self.id.as_deref()))
    }
}

/// What an event means for the subject's access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Payment completed: grant access.
    GrantAccess,
    /// Subscription ended or payment failed: revoke access.
    RevokeAccess,
    /// Not relevant to access.
    Unhandled,
}

impl EventKind {
    /// Classify a Stripe event type string.
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" | "invoice.paid" | "payment_intent.succeeded" => {
                Self::GrantAccess
            }
            "customer.subscription.deleted" | "invoice.payment_failed" => Self::RevokeAccess,
            _ => Self::Unhandled,
        }
    }
}

impl StripeEvent {
    /// Classify this event.
    pub fn kind(&self) -> EventKind {
        EventKind::from_event_type(&self.event_type)
    }

    /// The object the event is about.
    pub fn subject(&self) -> &EventSubject {
        &self.data.object
    }
}
