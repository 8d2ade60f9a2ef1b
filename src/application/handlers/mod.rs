//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod relay;

pub use relay::{RelayError, RelayEventCommand, RelayEventHandler, RelayOutcome};
