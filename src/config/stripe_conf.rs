use serde::{Deserialize, Serialize};
use std::env;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// Payment processor (Stripe) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Secret API key used for server-side calls
    pub secret_key: String,
    /// Currency every quote is charged in (single-currency system)
    pub currency: String,
    /// API base URL, overridable for test doubles
    pub api_base: String,
}

impl StripeConfig {
    /// Load Stripe configuration from environment variables
    ///
    /// Expected environment variables:
    /// - STRIPE_SECRET_KEY: secret API key (required)
    /// - STRIPE_CURRENCY: ISO 4217 currency code (defaults to "usd")
    /// - STRIPE_API_BASE: API base URL (defaults to https://api.stripe.com)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading Stripe configuration from environment variables");

        let secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| {
            error!("STRIPE_SECRET_KEY environment variable not found");
            ConfigError::EnvVarNotFound("STRIPE_SECRET_KEY".to_string())
        })?;

        let currency = env::var("STRIPE_CURRENCY").unwrap_or_else(|_| {
            warn!("STRIPE_CURRENCY not set, using default: usd");
            "usd".to_string()
        });

        let api_base = env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string());

        let config = StripeConfig {
            secret_key,
            currency,
            api_base,
        };

        config.validate()?;
        info!("Stripe configuration loaded successfully");
        Ok(config)
    }

    /// Create StripeConfig for testing
    pub fn from_test_env() -> Self {
        StripeConfig {
            secret_key: "sk_test_0000000000".to_string(),
            currency: "usd".to_string(),
            api_base: "http://localhost:12111".to_string(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            error!("Stripe secret key is empty");
            return Err(ConfigError::ValidationError(
                "Stripe secret key cannot be empty".to_string(),
            ));
        }

        if self.currency.len() != 3 {
            error!("Invalid Stripe currency code: {}", self.currency);
            return Err(ConfigError::ValidationError(
                "Stripe currency must be a 3-letter ISO 4217 code".to_string(),
            ));
        }

        if self.api_base.is_empty() {
            return Err(ConfigError::ValidationError(
                "Stripe API base URL cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_config_is_valid() {
        let config = StripeConfig::from_test_env();
        assert!(config.validate().is_ok());
        assert_eq!(config.currency, "usd");
    }

    #[test]
    fn test_validate_empty_secret_key() {
        let mut config = StripeConfig::from_test_env();
        config.secret_key = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_currency() {
        let mut config = StripeConfig::from_test_env();
        config.currency = "dollars".to_string();
        assert!(config.validate().is_err());
    }
}
