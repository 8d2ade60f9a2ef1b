//! Membership API port for external access management.
//!
//! Defines the contract for the service that owns users and access passes
//! (Whop). The relay never stores either; every grant re-resolves the user.
//!
//! # Design
//!
//! - **Stateless**: the membership API is the only source of truth
//! - **Idempotent writes**: pass creation and revocation carry an idempotency key
//! - **No retries**: failures are reported once and left to the caller to log

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::webhook::IdempotencyKey;

/// Port for membership/access-pass provisioning.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    /// Resolve the user owning `email`, creating it if needed.
    ///
    /// A response without a user id is an error.
    async fn get_or_create_user(&self, email: &str) -> Result<MembershipUser, MembershipApiError>;

    /// Grant an access pass for a product.
    async fn create_access_pass(
        &self,
        request: CreateAccessPassRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), MembershipApiError>;

    /// Revoke the access pass matching an external reference.
    async fn revoke_access_pass(
        &self,
        request: RevokeAccessPassRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), MembershipApiError>;
}

/// A user as returned by the membership API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipUser {
    /// Opaque user identifier.
    pub id: String,

    /// Email the user was resolved by, when echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request body for resolving a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetOrCreateUserRequest {
    pub email: String,
}

/// Request body for granting an access pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAccessPassRequest {
    pub user_id: String,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
}

/// Request body for revoking an access pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokeAccessPassRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
}

/// Errors from membership API operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipApiError {
    /// Error code for categorization.
    pub code: MembershipApiErrorCode,

    /// Human-readable message.
    pub message: String,

    /// HTTP status returned by the API, if a response was received.
    pub status: Option<u16>,

    /// Raw response body, if a response was received.
    pub body: Option<String>,
}

impl MembershipApiError {
    /// Create a new membership API error.
    pub fn new(code: MembershipApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(MembershipApiErrorCode::NetworkError, message)
    }

    /// Create an error for a non-success status.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            code: MembershipApiErrorCode::HttpError,
            message: format!("status {}: {}", status, body),
            status: Some(status),
            body: Some(body),
        }
    }

    /// Create an error for a response that could not be understood.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(MembershipApiErrorCode::InvalidResponse, message)
    }

    /// Create the error for a user response that carries no id.
    pub fn missing_user_id() -> Self {
        Self::new(
            MembershipApiErrorCode::MissingUserId,
            "get_or_create response did not contain a user id",
        )
    }
}

impl std::fmt::Display for MembershipApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MembershipApiError {}

/// Membership API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipApiErrorCode {
    /// Request never produced a response.
    NetworkError,

    /// API answered with a non-success status.
    HttpError,

    /// Response body was not the expected JSON.
    InvalidResponse,

    /// User response had no identifier.
    MissingUserId,
}

impl std::fmt::Display for MembershipApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MembershipApiErrorCode::NetworkError => "network_error",
            MembershipApiErrorCode::HttpError => "http_error",
            MembershipApiErrorCode::InvalidResponse => "invalid_response",
            MembershipApiErrorCode::MissingUserId => "missing_user_id",
        };
        write!(f, "{}", s)
    }
}
