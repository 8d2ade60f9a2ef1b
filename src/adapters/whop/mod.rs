//! Whop membership API adapter.
//!
//! Implements the `MembershipApi` port for Whop, including:
//! - User resolution by email (`/users/get_or_create`)
//! - Access pass grants (`/access_passes`)
//! - Access pass revocation (`/access_passes/revoke`)
//!
//! # Configuration
//!
//! Required environment variables:
//! - `WHOP_API_KEY`: bearer token for the Whop API
//! - `WHOP_PRODUCT_ID`: product attached to every granted pass

mod mock_membership_api;
mod whop_adapter;

pub use mock_membership_api::{MembershipCall, MockMembershipApi};
pub use whop_adapter::{WhopConfig, WhopMembershipAdapter};
