//! Membership API configuration (Whop)

use serde::Deserialize;

use super::error::ValidationError;

/// Production base URL of the Whop REST API.
pub const DEFAULT_WHOP_API_BASE_URL: &str = "https://api.whop.com/api/v1";

/// Membership API configuration
#[derive(Clone, Deserialize)]
pub struct MembershipConfig {
    /// Bearer token for the Whop API
    #[serde(default)]
    pub whop_api_key: String,

    /// Product every granted access pass is attached to
    #[serde(default)]
    pub whop_product_id: String,

    /// Base URL for the Whop API
    #[serde(default = "default_base_url")]
    pub whop_api_base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_WHOP_API_BASE_URL.to_string()
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            whop_api_key: String::new(),
            whop_product_id: String::new(),
            whop_api_base_url: default_base_url(),
        }
    }
}

impl std::fmt::Debug for MembershipConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipConfig")
            .field("whop_api_key", &"[REDACTED]")
            .field("whop_product_id", &self.whop_product_id)
            .field("whop_api_base_url", &self.whop_api_base_url)
            .finish()
    }
}

impl MembershipConfig {
    /// Validate membership configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.whop_api_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("WHOP_API_KEY"));
        }
        if self.whop_product_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("WHOP_PRODUCT_ID"));
        }
        if !self.whop_api_base_url.starts_with("https://")
            && !self.whop_api_base_url.starts_with("http://")
        {
            return Err(ValidationError::InvalidWhopBaseUrl);
        }
        Ok(())
    }
}
