//! Mock membership API for testing.
//!
//! Provides a configurable in-memory implementation of `MembershipApi` for
//! unit and integration tests. Supports:
//! - Call tracking (in order, with idempotency keys)
//! - Error injection per method
//! - Waiting for calls made from spawned tasks

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::webhook::IdempotencyKey;
use crate::ports::{
    CreateAccessPassRequest, MembershipApi, MembershipApiError, MembershipUser,
    RevokeAccessPassRequest,
};

/// Recorded call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipCall {
    GetOrCreateUser {
        email: String,
    },
    CreateAccessPass {
        request: CreateAccessPassRequest,
        idempotency_key: String,
    },
    RevokeAccessPass {
        request: RevokeAccessPassRequest,
        idempotency_key: String,
    },
}

impl MembershipCall {
    fn method(&self) -> &'static str {
        match self {
            Self::GetOrCreateUser { .. } => "get_or_create_user",
            Self::CreateAccessPass { .. } => "create_access_pass",
            Self::RevokeAccessPass { .. } => "revoke_access_pass",
        }
    }
}

/// Mock membership API for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockMembershipApi::new();
/// mock.set_method_error("create_access_pass", MembershipApiError::http(500, "boom"));
///
/// let handler = RelayEventHandler::new(Arc::new(mock.clone()), "prod_1");
/// handler.handle(cmd).await;
///
/// assert_eq!(mock.call_count("get_or_create_user"), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockMembershipApi {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Users already resolved, by email.
    users: HashMap<String, MembershipUser>,

    /// Specific errors by method name.
    method_errors: HashMap<String, MembershipApiError>,

    /// Track calls for assertions.
    call_log: Vec<MembershipCall>,
}

impl MockMembershipApi {
    /// Create a new mock with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: MembershipApiError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MembershipCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method() == method)
            .count()
    }

    /// Wait until at least `count` calls were recorded, or the timeout expires.
    ///
    /// Returns the calls recorded so far either way.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> Vec<MembershipCall> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let calls = self.calls();
            if calls.len() >= count || tokio::time::Instant::now() >= deadline {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, call: MembershipCall) -> Result<(), MembershipApiError> {
        let method = call.method();
        let mut state = self.inner.lock().unwrap();
        state.call_log.push(call);

        match state.method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MembershipApi for MockMembershipApi {
    async fn get_or_create_user(&self, email: &str) -> Result<MembershipUser, MembershipApiError> {
        self.record_call(MembershipCall::GetOrCreateUser {
            email: email.to_string(),
        })?;

        let mut state = self.inner.lock().unwrap();
        let next_id = state.users.len() + 1;
        let user = state
            .users
            .entry(email.to_string())
            .or_insert_with(|| MembershipUser {
                id: format!("user_mock_{}", next_id),
                email: Some(email.to_string()),
            })
            .clone();
        Ok(user)
    }

    async fn create_access_pass(
        &self,
        request: CreateAccessPassRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), MembershipApiError> {
        self.record_call(MembershipCall::CreateAccessPass {
            request,
            idempotency_key: idempotency_key.to_string(),
        })
    }

    async fn revoke_access_pass(
        &self,
        request: RevokeAccessPassRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), MembershipApiError> {
        self.record_call(MembershipCall::RevokeAccessPass {
            request,
            idempotency_key: idempotency_key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_same_user_for_same_email() {
        let mock = MockMembershipApi::new();

        let first = mock.get_or_create_user("a@x.com").await.unwrap();
        let second = mock.get_or_create_user("a@x.com").await.unwrap();
        let other = mock.get_or_create_user("b@x.com").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first.id, other.id);
        assert_eq!(mock.call_count("get_or_create_user"), 3);
    }

    #[tokio::test]
    async fn injected_error_is_returned_after_recording() {
        let mock = MockMembershipApi::new();
        mock.set_method_error("revoke_access_pass", MembershipApiError::http(500, "boom"));

        let key = IdempotencyKey::for_reference(Some("sub_1"));
        let result = mock
            .revoke_access_pass(
                RevokeAccessPassRequest {
                    external_reference: Some("sub_1".to_string()),
                },
                &key,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(mock.call_count("revoke_access_pass"), 1);
    }

    #[tokio::test]
    async fn waits_for_calls_from_spawned_task() {
        let mock = MockMembershipApi::new();

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                mock.get_or_create_user("a@x.com").await
            })
        };

        let calls = mock.wait_for_calls(1, Duration::from_secs(1)).await;
        assert_eq!(calls.len(), 1);
        assert!(task.await.unwrap().is_ok());
    }
}
