//! Whop membership API adapter.
//!
//! Implements the `MembershipApi` port against Whop's REST API.
//!
//! # Security
//!
//! - The API key is held in a `secrecy::SecretString` and only exposed when
//!   building the bearer header
//! - Request and response bodies are logged; the key never is
//!
//! # Configuration
//!
//! ```ignore
//! let config = WhopConfig::new(api_key);
//! let adapter = WhopMembershipAdapter::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::{MembershipConfig, DEFAULT_WHOP_API_BASE_URL};
use crate::domain::webhook::IdempotencyKey;
use crate::ports::{
    CreateAccessPassRequest, GetOrCreateUserRequest, MembershipApi, MembershipApiError,
    MembershipUser, RevokeAccessPassRequest,
};

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Whop API configuration.
#[derive(Clone)]
pub struct WhopConfig {
    /// Whop API key.
    api_key: SecretString,

    /// Base URL for the Whop API (default: https://api.whop.com/api/v1).
    api_base_url: String,
}

impl WhopConfig {
    /// Create a new Whop configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_WHOP_API_BASE_URL.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl From<&MembershipConfig> for WhopConfig {
    fn from(config: &MembershipConfig) -> Self {
        Self::new(config.whop_api_key.clone()).with_base_url(config.whop_api_base_url.clone())
    }
}

/// Whop membership adapter.
pub struct WhopMembershipAdapter {
    config: WhopConfig,
    http_client: reqwest::Client,
}

impl WhopMembershipAdapter {
    /// Create a new Whop adapter with the given configuration.
    pub fn new(config: WhopConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// POST a JSON body and return the parsed JSON response.
    ///
    /// An empty success body is returned as an empty object.
    async fn post_json<B: Serialize + std::fmt::Debug>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<serde_json::Value, MembershipApiError> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let mut request = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key.as_str());
        }

        tracing::debug!(
            url = %url,
            payload = ?body,
            idempotency_key = idempotency_key.map(IdempotencyKey::as_str),
            "Whop request"
        );

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Whop request failed");
            MembershipApiError::network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MembershipApiError::network(e.to_string()))?;

        tracing::info!(url = %url, status = status.as_u16(), body = %text, "Whop response");

        if !status.is_success() {
            tracing::error!(
                url = %url,
                payload = ?body,
                status = status.as_u16(),
                body = %text,
                "Whop API returned an error"
            );
            return Err(MembershipApiError::http(status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&text).map_err(|e| {
            MembershipApiError::invalid_response(format!("Failed to parse Whop response: {}", e))
        })
    }
}

/// Pull the user id out of a `get_or_create` response.
fn user_from_response(value: &serde_json::Value) -> Result<MembershipUser, MembershipApiError> {
    let id = match value.get("id") {
        Some(serde_json::Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(serde_json::Value::Number(id)) => id.to_string(),
        _ => return Err(MembershipApiError::missing_user_id()),
    };
    let email = value
        .get("email")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    Ok(MembershipUser { id, email })
}

#[async_trait]
impl MembershipApi for WhopMembershipAdapter {
    async fn get_or_create_user(&self, email: &str) -> Result<MembershipUser, MembershipApiError> {
        let body = GetOrCreateUserRequest {
            email: email.to_string(),
        };
        let value = self.post_json("/users/get_or_create", &body, None).await?;
        user_from_response(&value)
    }

    async fn create_access_pass(
        &self,
        request: CreateAccessPassRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), MembershipApiError> {
        self.post_json("/access_passes", &request, Some(idempotency_key))
            .await?;
        Ok(())
    }

    async fn revoke_access_pass(
        &self,
        request: RevokeAccessPassRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), MembershipApiError> {
        self.post_json("/access_passes/revoke", &request, Some(idempotency_key))
            .await?;
        Ok(())
    }
}
