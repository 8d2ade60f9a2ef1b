//! Relay handlers.
//!
//! ## Commands
//! - Relaying a verified Stripe event to the membership API

mod relay_event;

pub use relay_event::{RelayError, RelayEventCommand, RelayEventHandler, RelayOutcome};
