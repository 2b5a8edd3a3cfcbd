use serde::{Deserialize, Serialize};
use std::env;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret used to sign and validate access tokens
    pub secret: String,
    /// Access token lifetime in minutes
    pub access_token_expiry_minutes: i64,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JWT_SECRET: signing secret (required)
    /// - JWT_ACCESS_EXPIRY_MINUTES: access token lifetime (defaults to 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading JWT configuration from environment variables");

        let secret = env::var("JWT_SECRET").map_err(|_| {
            error!("JWT_SECRET environment variable not found");
            ConfigError::EnvVarNotFound("JWT_SECRET".to_string())
        })?;

        let access_token_expiry_minutes = env::var("JWT_ACCESS_EXPIRY_MINUTES")
            .unwrap_or_else(|_| {
                warn!("JWT_ACCESS_EXPIRY_MINUTES not set, using default: 60");
                "60".to_string()
            })
            .parse::<i64>()
            .map_err(|_| {
                error!("Invalid JWT_ACCESS_EXPIRY_MINUTES value");
                ConfigError::InvalidValue("Invalid JWT_ACCESS_EXPIRY_MINUTES value".to_string())
            })?;

        let config = JwtConfig {
            secret,
            access_token_expiry_minutes,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create JwtConfig for testing
    pub fn from_test_env() -> Self {
        JwtConfig {
            secret: "test-secret-at-least-32-chars-long!".to_string(),
            access_token_expiry_minutes: 15,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < 32 {
            error!("JWT secret is too short");
            return Err(ConfigError::ValidationError(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }
        if self.access_token_expiry_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "JWT access token expiry must be positive".to_string(),
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
        let config = JwtConfig::from_test_env();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_short_secret() {
        let mut config = JwtConfig::from_test_env();
        config.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_expiry() {
        let mut config = JwtConfig::from_test_env();
        config.access_token_expiry_minutes = 0;
        assert!(config.validate().is_err());
    }
}
