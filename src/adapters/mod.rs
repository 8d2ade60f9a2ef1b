//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Inbound axum router for webhooks
//! - `whop` - Outbound Whop membership API client

pub mod http;
pub mod whop;

pub use http::{app_router, WebhookAppState};
pub use whop::{MembershipCall, MockMembershipApi, WhopConfig, WhopMembershipAdapter};
