//! HTTP handlers for the webhook relay.
//!
//! The webhook handler only verifies and acknowledges. Membership calls run
//! on a spawned task that starts once the acknowledgment body has been
//! handed to the connection.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, StreamExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::application::handlers::relay::{
    RelayError, RelayEventCommand, RelayEventHandler, RelayOutcome,
};
use crate::domain::webhook::{StripeEvent, StripeWebhookVerifier, WebhookError};

const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";
const ACK_BODY: &[u8] = br#"{"received":true}"#;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook routes.
///
/// Cloned per request; dependencies are immutable and `Arc`-wrapped.
#[derive(Clone)]
pub struct WebhookAppState {
    pub verifier: Arc<StripeWebhookVerifier>,
    pub relay_handler: Arc<RelayEventHandler>,
}

impl WebhookAppState {
    pub fn new(verifier: StripeWebhookVerifier, relay_handler: RelayEventHandler) -> Self {
        Self {
            verifier: Arc::new(verifier),
            relay_handler: Arc::new(relay_handler),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET / - Liveness check
pub async fn liveness() -> &'static str {
    "OK"
}

/// POST /stripe-webhook - Verify and acknowledge a Stripe event
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookRejection> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader)?;

    let event = state.verifier.verify_and_parse(&body, signature)?;

    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Stripe event received");

    let (response, sent) = acknowledgment();
    spawn_relay(state.relay_handler.clone(), event, sent);

    Ok(response)
}

/// Fallback for unknown routes and methods.
pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    tracing::warn!(method = %method, path = %uri.path(), "Unknown route");
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Resolves once the acknowledgment body has been written out or dropped.
pub struct ResponseSent(oneshot::Receiver<()>);

impl ResponseSent {
    pub async fn wait(self) {
        // Only the drop of the sender matters.
        let _ = self.0.await;
    }
}

/// Build the `200 {"received":true}` response and its sent signal.
///
/// The body stream owns the signal's sender. Hyper drops the body after its
/// last frame is written, or when the connection goes away.
pub fn acknowledgment() -> (Response, ResponseSent) {
    let (tx, rx) = oneshot::channel::<()>();

    let chunks = stream::once(async { Ok::<_, Infallible>(Bytes::from_static(ACK_BODY)) }).map(
        move |chunk| {
            let _held = &tx;
            chunk
        },
    );

    let mut response = Response::new(Body::from_stream(chunks));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(ACK_BODY.len()));

    (response, ResponseSent(rx))
}

/// Run the relay for `event` on its own task.
///
/// The task waits for `sent` before any outbound work, so the provider always
/// has its acknowledgment first. Its result is logged here; the handle is only
/// awaited in tests.
pub fn spawn_relay(
    handler: Arc<RelayEventHandler>,
    event: StripeEvent,
    sent: ResponseSent,
) -> JoinHandle<Result<RelayOutcome, RelayError>> {
    let span = tracing::info_span!("relay", event_id = %event.id, event_type = %event.event_type);

    tokio::spawn(
        async move {
            sent.wait().await;

            let result = handler.handle(RelayEventCommand { event }).await;
            match &result {
                Ok(outcome) => tracing::info!(outcome = ?outcome, "Relay finished"),
                Err(e) => tracing::error!(error = %e, "Relay failed"),
            }
            result
        }
        .instrument(span),
    )
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts verification failures into the provider-facing 400 response.
#[derive(Debug)]
pub struct WebhookRejection(WebhookError);

impl From<WebhookError> for WebhookRejection {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "Webhook verification failed");
        (self.0.status_code(), format!("Webhook Error: {}", self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::whop::{MembershipCall, MockMembershipApi};
    use serde_json::json;
    use std::time::Duration;

    fn event(value: serde_json::Value) -> StripeEvent {
        serde_json::from_value(value).unwrap()
    }

    fn relay_handler(mock: &MockMembershipApi) -> Arc<RelayEventHandler> {
        Arc::new(RelayEventHandler::new(Arc::new(mock.clone()), "prod_1"))
    }

    #[tokio::test]
    async fn acknowledgment_body_is_received_true() {
        let (response, _sent) = acknowledgment();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "application/json"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"received": true}));
    }

    #[tokio::test]
    async fn relay_waits_until_acknowledgment_is_sent() {
        let mock = MockMembershipApi::new();
        let (response, sent) = acknowledgment();

        let task = spawn_relay(
            relay_handler(&mock),
            event(json!({
                "id": "evt_1",
                "type": "customer.subscription.deleted",
                "data": {"object": {"id": "sub_1"}}
            })),
            sent,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(mock.calls().is_empty());
        assert!(!task.is_finished());

        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::AccessRevoked {
                external_reference: Some("sub_1".to_string())
            }
        );
        assert_eq!(mock.call_count("revoke_access_pass"), 1);
    }

    #[tokio::test]
    async fn dropped_acknowledgment_still_releases_relay() {
        let mock = MockMembershipApi::new();
        let (response, sent) = acknowledgment();

        let task = spawn_relay(
            relay_handler(&mock),
            event(json!({
                "type": "invoice.paid",
                "data": {"object": {"customer_email": "a@x.com", "id": "in_1"}}
            })),
            sent,
        );
        drop(response);
        task.await.unwrap().unwrap();

        assert!(matches!(
            mock.calls().first(),
            Some(MembershipCall::GetOrCreateUser { email }) if email == "a@x.com"
        ));
    }

    #[test]
    fn rejection_is_plain_text_400() {
        let response = WebhookRejection::from(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/plain")));
    }
}
