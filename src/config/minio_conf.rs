use serde::{Deserialize, Serialize};
use std::env;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// MinIO (blob storage) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioConfig {
    /// MinIO endpoint host:port
    pub endpoint: String,
    /// Access key
    pub access_key: String,
    /// Secret key
    pub secret_key: String,
    /// Bucket holding quote attachments and project images
    pub bucket_name: String,
    /// Public base URL used to build download links
    pub links_prefix: String,
    /// Whether to use TLS when talking to the endpoint
    pub use_ssl: bool,
}

impl MinioConfig {
    /// Load MinIO configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MINIO_ENDPOINT: host:port (required)
    /// - MINIO_ACCESS_KEY / MINIO_SECRET_KEY: credentials (required)
    /// - MINIO_BUCKET: bucket name (defaults to "crestline-uploads")
    /// - MINIO_LINKS_PREFIX: public base URL for download links (required)
    /// - MINIO_USE_SSL: "true"/"false" (defaults to false)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MinIO configuration from environment variables");

        let endpoint = env::var("MINIO_ENDPOINT").map_err(|_| {
            error!("MINIO_ENDPOINT environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_ENDPOINT".to_string())
        })?;

        let access_key = env::var("MINIO_ACCESS_KEY").map_err(|_| {
            error!("MINIO_ACCESS_KEY environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_ACCESS_KEY".to_string())
        })?;

        let secret_key = env::var("MINIO_SECRET_KEY").map_err(|_| {
            error!("MINIO_SECRET_KEY environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_SECRET_KEY".to_string())
        })?;

        let bucket_name = env::var("MINIO_BUCKET").unwrap_or_else(|_| {
            warn!("MINIO_BUCKET not set, using default: crestline-uploads");
            "crestline-uploads".to_string()
        });

        let links_prefix = env::var("MINIO_LINKS_PREFIX").map_err(|_| {
            error!("MINIO_LINKS_PREFIX environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_LINKS_PREFIX".to_string())
        })?;

        let use_ssl = env::var("MINIO_USE_SSL")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = MinioConfig {
            endpoint,
            access_key,
            secret_key,
            bucket_name,
            links_prefix,
            use_ssl,
        };

        config.validate()?;
        info!("MinIO configuration loaded successfully");
        Ok(config)
    }

    /// Create MinioConfig for testing
    pub fn from_test_env() -> Self {
        MinioConfig {
            endpoint: "localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket_name: "crestline-test".to_string(),
            links_prefix: "http://localhost:9000".to_string(),
            use_ssl: false,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "MinIO endpoint cannot be empty".to_string(),
            ));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "MinIO credentials cannot be empty".to_string(),
            ));
        }
        if self.bucket_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "MinIO bucket name cannot be empty".to_string(),
            ));
        }
        if self.links_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "MinIO links prefix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Full endpoint URL including scheme
    pub fn get_endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}
