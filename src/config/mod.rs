//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `RELAY_` prefix and nested values use double underscores as separators.
//!
//! The short variable names used by existing deployments (`PORT`,
//! `STRIPE_WEBHOOK_SECRET`, `STRIPE_KEY`, `WHOP_API_KEY`, `WHOP_PRODUCT_ID`)
//! are honored as overrides of their nested counterparts.
//!
//! # Example
//!
//! ```no_run
//! use stripe_whop_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on port {}", config.server.port);
//! ```

mod error;
mod membership;
mod payment;
mod server;

pub use error::{ConfigError, ValidationError};
pub use membership::{MembershipConfig, DEFAULT_WHOP_API_BASE_URL};
pub use payment::{PaymentConfig, DEFAULT_SIGNATURE_TOLERANCE_SECS};
pub use server::{LogFormat, ServerConfig};

use serde::Deserialize;

/// Short environment variable names and the nested keys they override.
const SHORTHAND_VARS: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("STRIPE_WEBHOOK_SECRET", "payment.stripe_webhook_secret"),
    ("STRIPE_KEY", "payment.stripe_api_key"),
    ("WHOP_API_KEY", "membership.whop_api_key"),
    ("WHOP_PRODUCT_ID", "membership.whop_product_id"),
];

/// Root application configuration
///
/// Loaded once at startup; the relevant sections are handed to the adapters
/// that need them and never re-read from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Payment configuration (Stripe webhook verification)
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Membership API configuration (Whop)
    #[serde(default)]
    pub membership: MembershipConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Applies the shorthand variables on top
    /// 5. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `RELAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `RELAY__MEMBERSHIP__WHOP_PRODUCT_ID=prod_1` -> `membership.whop_product_id = prod_1`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    /// Missing required values are reported by [`AppConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder().add_source(
            config::Environment::default()
                .prefix("RELAY")
                .separator("__"),
        );

        for (var, key) in SHORTHAND_VARS {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        let config = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the first missing or malformed value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.payment.validate()?;
        self.membership.validate()?;
        Ok(())
    }

    /// Load and validate in one step, as done at startup.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }
}
