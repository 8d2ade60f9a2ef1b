//! Axum router configuration for the webhook relay.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers::{handle_stripe_webhook, liveness, not_found, WebhookAppState};

/// Path Stripe delivers events to.
pub const STRIPE_WEBHOOK_PATH: &str = "/stripe-webhook";

/// Create the webhook routes.
///
/// # Routes
/// - `GET /` - Liveness check
/// - `POST /stripe-webhook` - Handle Stripe webhooks (signature verified, no auth)
///
/// Wrong methods on known paths fall through to 404 rather than 405.
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/", get(liveness).fallback(not_found))
        .route(STRIPE_WEBHOOK_PATH, post(handle_stripe_webhook).fallback(not_found))
}

/// Create the complete application router.
///
/// # Example
///
/// ```ignore
/// let state = WebhookAppState::new(verifier, relay_handler);
/// let listener = tokio::net::TcpListener::bind(addr).await?;
/// axum::serve(listener, app_router(state)).await?;
/// ```
pub fn app_router(state: WebhookAppState) -> Router {
    webhook_routes()
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
