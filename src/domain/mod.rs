//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `webhook` - Stripe signature verification, event model and relay planning

pub mod webhook;
