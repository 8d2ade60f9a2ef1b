//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Stripe allows events up to five minutes old by default.
pub const DEFAULT_SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Payment configuration (Stripe)
#[derive(Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key. Not needed for webhook verification, checked when present.
    #[serde(default)]
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret
    #[serde(default)]
    pub stripe_webhook_secret: String,

    /// Maximum accepted age of a signed webhook, in seconds
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,
}

fn default_signature_tolerance() -> i64 {
    DEFAULT_SIGNATURE_TOLERANCE_SECS
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: None,
            stripe_webhook_secret: String::new(),
            signature_tolerance_secs: DEFAULT_SIGNATURE_TOLERANCE_SECS,
        }
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("stripe_api_key", &self.stripe_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("stripe_webhook_secret", &"[REDACTED]")
            .field("signature_tolerance_secs", &self.signature_tolerance_secs)
            .finish()
    }
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key
            .as_deref()
            .is_some_and(|key| key.starts_with("sk_test_") || key.starts_with("rk_test_"))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if let Some(key) = self.stripe_api_key.as_deref() {
            if !key.starts_with("sk_") && !key.starts_with("rk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }

        if !(1..=3600).contains(&self.signature_tolerance_secs) {
            return Err(ValidationError::InvalidSignatureTolerance);
        }

        Ok(())
    }
}
