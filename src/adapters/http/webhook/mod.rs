//! HTTP adapter for the Stripe webhook relay.
//!
//! - `GET /` - Liveness check
//! - `POST /stripe-webhook` - Verify, acknowledge, then relay in the background
//!
//! Every other method/path answers 404.

mod handlers;
mod routes;

pub use handlers::{
    acknowledgment, handle_stripe_webhook, liveness, not_found, spawn_relay, ResponseSent,
    WebhookAppState, WebhookRejection,
};
pub use routes::{app_router, webhook_routes, STRIPE_WEBHOOK_PATH};
