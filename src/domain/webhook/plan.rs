//! Turns a verified event into the membership change it calls for.

use super::event::{EventKind, StripeEvent};

/// The outbound work one event requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayPlan {
    /// Resolve the user by email, then attach an access pass.
    Grant {
        email: String,
        external_reference: Option<String>,
    },
    /// Revoke the access pass carrying this reference.
    Revoke { external_reference: Option<String> },
    /// Grant-triggering event without any usable email.
    MissingEmail,
    /// Event type the relay does not act on.
    Ignore,
}

impl RelayPlan {
    /// Classify an event. Pure; performs no I/O.
    pub fn for_event(event: &StripeEvent) -> Self {
        let subject = event.subject();
        let external_reference = subject.external_reference().map(str::to_string);

        match event.kind() {
            EventKind::GrantAccess => match subject.email() {
                Some(email) => Self::Grant {
                    email: email.to_string(),
                    external_reference,
                },
                None => Self::MissingEmail,
            },
            EventKind::RevokeAccess => Self::Revoke { external_reference },
            EventKind::Unhandled => Self::Ignore,
        }
    }
}
