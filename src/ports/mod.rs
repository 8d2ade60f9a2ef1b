//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `MembershipApi` - User resolution and access-pass provisioning (Whop)

mod membership_api;

pub use membership_api::{
    CreateAccessPassRequest, GetOrCreateUserRequest, MembershipApi, MembershipApiError,
    MembershipApiErrorCode, MembershipUser, RevokeAccessPassRequest,
};
