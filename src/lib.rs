//! Stripe to Whop membership relay.
//!
//! Receives signed Stripe webhooks, acknowledges them immediately, and then
//! grants or revokes Whop access passes in the background.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
