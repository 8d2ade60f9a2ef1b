//! RelayEventHandler - Command handler that applies a verified Stripe event to Whop.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::webhook::{IdempotencyKey, RelayPlan, StripeEvent};
use crate::ports::{
    CreateAccessPassRequest, MembershipApi, MembershipApiError, RevokeAccessPassRequest,
};

/// Command to relay one verified webhook event.
#[derive(Debug, Clone)]
pub struct RelayEventCommand {
    /// Event whose signature has already been checked.
    pub event: StripeEvent,
}

/// Result of relaying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// User resolved and access pass created.
    AccessGranted {
        user_id: String,
        external_reference: Option<String>,
    },
    /// Access pass revoked.
    AccessRevoked { external_reference: Option<String> },
    /// Grant-triggering event carried no email; nothing was called.
    SkippedNoEmail,
    /// Event type not relayed.
    Ignored { event_type: String },
}

/// Failure of the outbound workflow for one event.
///
/// The webhook was already acknowledged, so these are only logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Failed to resolve membership user: {0}")]
    ResolveUser(MembershipApiError),

    #[error("Failed to create access pass: {0}")]
    GrantAccess(MembershipApiError),

    #[error("Failed to revoke access pass: {0}")]
    RevokeAccess(MembershipApiError),
}

/// Handler that turns a verified event into membership API calls.
///
/// Calls are made sequentially (user, then pass) and never retried.
pub struct RelayEventHandler {
    membership_api: Arc<dyn MembershipApi>,
    product_id: String,
}

impl RelayEventHandler {
    pub fn new(membership_api: Arc<dyn MembershipApi>, product_id: impl Into<String>) -> Self {
        Self {
            membership_api,
            product_id: product_id.into(),
        }
    }

    pub async fn handle(&self, cmd: RelayEventCommand) -> Result<RelayOutcome, RelayError> {
        let event = cmd.event;
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Relaying Stripe event");

        match RelayPlan::for_event(&event) {
            RelayPlan::Grant {
                email,
                external_reference,
            } => self.grant(&event, email, external_reference).await,
            RelayPlan::Revoke { external_reference } => {
                self.revoke(&event, external_reference).await
            }
            RelayPlan::MissingEmail => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "No email in webhook payload, skipping grant"
                );
                Ok(RelayOutcome::SkippedNoEmail)
            }
            RelayPlan::Ignore => {
                tracing::debug!(event_type = %event.event_type, "Ignoring unhandled event type");
                Ok(RelayOutcome::Ignored {
                    event_type: event.event_type,
                })
            }
        }
    }

    async fn grant(
        &self,
        event: &StripeEvent,
        email: String,
        external_reference: Option<String>,
    ) -> Result<RelayOutcome, RelayError> {
        let user = self
            .membership_api
            .get_or_create_user(&email)
            .await
            .map_err(RelayError::ResolveUser)?;

        let idempotency_key = self.idempotency_key(event, external_reference.as_deref());
        let request = CreateAccessPassRequest {
            user_id: user.id.clone(),
            product_id: self.product_id.clone(),
            external_reference: external_reference.clone(),
        };

        self.membership_api
            .create_access_pass(request, &idempotency_key)
            .await
            .map_err(RelayError::GrantAccess)?;

        tracing::info!(
            event_id = %event.id,
            user_id = %user.id,
            external_reference = external_reference.as_deref(),
            "Access pass granted"
        );

        Ok(RelayOutcome::AccessGranted {
            user_id: user.id,
            external_reference,
        })
    }

    async fn revoke(
        &self,
        event: &StripeEvent,
        external_reference: Option<String>,
    ) -> Result<RelayOutcome, RelayError> {
        let idempotency_key = self.idempotency_key(event, external_reference.as_deref());
        let request = RevokeAccessPassRequest {
            external_reference: external_reference.clone(),
        };

        self.membership_api
            .revoke_access_pass(request, &idempotency_key)
            .await
            .map_err(RelayError::RevokeAccess)?;

        tracing::info!(
            event_id = %event.id,
            external_reference = external_reference.as_deref(),
            "Access pass revoked"
        );

        Ok(RelayOutcome::AccessRevoked { external_reference })
    }

    fn idempotency_key(&self, event: &StripeEvent, external_reference: Option<&str>) -> IdempotencyKey {
        let key = IdempotencyKey::for_reference(external_reference);
        if !key.is_derived() {
            tracing::warn!(
                event_id = %event.id,
                idempotency_key = %key,
                "Event has no external reference; idempotency key will not deduplicate retries"
            );
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::whop::{MembershipCall, MockMembershipApi};
    use serde_json::json;

    const PRODUCT_ID: &str = "prod_test";

    fn handler(mock: &MockMembershipApi) -> RelayEventHandler {
        RelayEventHandler::new(Arc::new(mock.clone()), PRODUCT_ID)
    }

    fn command(value: serde_json::Value) -> RelayEventCommand {
        RelayEventCommand {
            event: serde_json::from_value(value).unwrap(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Grant Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invoice_paid_resolves_user_then_grants_on_subscription() {
        let mock = MockMembershipApi::new();

        let outcome = handler(&mock)
            .handle(command(json!({
                "id": "evt_1",
                "type": "invoice.paid",
                "data": {"object": {"customer_email": "a@x.com", "subscription": "sub_1"}}
            })))
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            MembershipCall::GetOrCreateUser {
                email: "a@x.com".to_string()
            }
        );
        let user_id = match &outcome {
            RelayOutcome::AccessGranted { user_id, .. } => user_id.clone(),
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(
            calls[1],
            MembershipCall::CreateAccessPass {
                request: CreateAccessPassRequest {
                    user_id,
                    product_id: PRODUCT_ID.to_string(),
                    external_reference: Some("sub_1".to_string()),
                },
                idempotency_key: "sub_1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn checkout_without_subscription_uses_session_id() {
        let mock = MockMembershipApi::new();

        let outcome = handler(&mock)
            .handle(command(json!({
                "type": "checkout.session.completed",
                "data": {"object": {"id": "cs_1", "customer_details": {"email": "b@x.com"}}}
            })))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RelayOutcome::AccessGranted { ref external_reference, .. }
                if external_reference.as_deref() == Some("cs_1")
        ));
    }

    #[tokio::test]
    async fn grant_without_email_makes_no_calls() {
        let mock = MockMembershipApi::new();

        let outcome = handler(&mock)
            .handle(command(json!({
                "type": "payment_intent.succeeded",
                "data": {"object": {"id": "pi_1"}}
            })))
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::SkippedNoEmail);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn user_resolution_failure_stops_before_grant() {
        let mock = MockMembershipApi::new();
        mock.set_method_error("get_or_create_user", MembershipApiError::missing_user_id());

        let result = handler(&mock)
            .handle(command(json!({
                "type": "invoice.paid",
                "data": {"object": {"customer_email": "a@x.com", "subscription": "sub_1"}}
            })))
            .await;

        assert!(matches!(result, Err(RelayError::ResolveUser(_))));
        assert_eq!(mock.call_count("create_access_pass"), 0);
    }

    #[tokio::test]
    async fn grant_failure_is_reported() {
        let mock = MockMembershipApi::new();
        mock.set_method_error("create_access_pass", MembershipApiError::http(500, "boom"));

        let result = handler(&mock)
            .handle(command(json!({
                "type": "invoice.paid",
                "data": {"object": {"customer_email": "a@x.com", "id": "in_1"}}
            })))
            .await;

        assert_eq!(
            result,
            Err(RelayError::GrantAccess(MembershipApiError::http(500, "boom")))
        );
    }

    #[tokio::test]
    async fn redelivered_event_reuses_idempotency_key() {
        let mock = MockMembershipApi::new();
        let handler = handler(&mock);
        let payload = json!({
            "type": "invoice.paid",
            "data": {"object": {"customer_email": "a@x.com", "subscription": "sub_1"}}
        });

        handler.handle(command(payload.clone())).await.unwrap();
        handler.handle(command(payload)).await.unwrap();

        let keys: Vec<String> = mock
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                MembershipCall::CreateAccessPass {
                    idempotency_key, ..
                } => Some(idempotency_key),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec!["sub_1".to_string(), "sub_1".to_string()]);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Revoke Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_deleted_revokes_once_without_user_lookup() {
        let mock = MockMembershipApi::new();

        let outcome = handler(&mock)
            .handle(command(json!({
                "type": "customer.subscription.deleted",
                "data": {"object": {"id": "sub_1", "object": "subscription"}}
            })))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RelayOutcome::AccessRevoked {
                external_reference: Some("sub_1".to_string())
            }
        );
        assert_eq!(
            mock.calls(),
            vec![MembershipCall::RevokeAccessPass {
                request: RevokeAccessPassRequest {
                    external_reference: Some("sub_1".to_string())
                },
                idempotency_key: "sub_1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn payment_failed_without_subscription_revokes_invoice_id() {
        let mock = MockMembershipApi::new();

        handler(&mock)
            .handle(command(json!({
                "type": "invoice.payment_failed",
                "data": {"object": {"id": "in_1"}}
            })))
            .await
            .unwrap();

        assert!(matches!(
            mock.calls().as_slice(),
            [MembershipCall::RevokeAccessPass { request, .. }]
                if request.external_reference.as_deref() == Some("in_1")
        ));
    }

    #[tokio::test]
    async fn revoke_without_reference_uses_fallback_key() {
        let mock = MockMembershipApi::new();

        handler(&mock)
            .handle(command(json!({
                "type": "invoice.payment_failed",
                "data": {"object": {}}
            })))
            .await
            .unwrap();

        match mock.calls().as_slice() {
            [MembershipCall::RevokeAccessPass {
                request,
                idempotency_key,
            }] => {
                assert!(request.external_reference.is_none());
                assert!(idempotency_key.contains('-'));
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn revoke_failure_is_reported() {
        let mock = MockMembershipApi::new();
        mock.set_method_error("revoke_access_pass", MembershipApiError::network("refused"));

        let result = handler(&mock)
            .handle(command(json!({
                "type": "customer.subscription.deleted",
                "data": {"object": {"id": "sub_1"}}
            })))
            .await;

        assert!(matches!(result, Err(RelayError::RevokeAccess(_))));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Ignored Events
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_event_is_ignored() {
        let mock = MockMembershipApi::new();

        let outcome = handler(&mock)
            .handle(command(json!({
                "type": "customer.created",
                "data": {"object": {"id": "cus_1", "email": "a@x.com"}}
            })))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RelayOutcome::Ignored {
                event_type: "customer.created".to_string()
            }
        );
        assert!(mock.calls().is_empty());
    }
}
