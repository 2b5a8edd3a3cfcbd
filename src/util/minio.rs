use async_trait::async_trait;
use minio::s3::args::{BucketExistsArgs, MakeBucketArgs, PutObjectArgs, RemoveObjectArgs};
use minio::s3::client::{Client, ClientBuilder};
use minio::s3::creds::StaticProvider;
use minio::s3::http::BaseUrl;
use std::io::Cursor;
use tracing::{error, info, instrument, warn};

use crate::config::MinioConfig;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Operation error: {0}")]
    OperationError(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Boundary contract with blob storage. The pipeline treats uploads as
/// fire-and-forget: a failed upload degrades to an omitted attachment,
/// never a failed quote.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(
        &self,
        object_name: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), BlobError>;

    async fn remove_object(&self, object_name: &str) -> Result<(), BlobError>;

    /// Public download link for an uploaded object.
    fn download_link(&self, object_name: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct MinioService {
    client: Client,
    pub config: MinioConfig,
}

impl MinioService {
    #[instrument(skip(config), fields(endpoint = %config.endpoint, bucket = %config.bucket_name))]
    pub async fn new(config: MinioConfig) -> Result<Self, BlobError> {
        info!("Initializing MinIO service");

        config
            .validate()
            .map_err(|e| BlobError::ConfigError(e.to_string()))?;

        let base_url = config
            .get_endpoint_url()
            .parse::<BaseUrl>()
            .map_err(|e| BlobError::ConnectionError(format!("Invalid endpoint URL: {}", e)))?;

        let static_provider = StaticProvider::new(&config.access_key, &config.secret_key, None);

        let client = ClientBuilder::new(base_url)
            .provider(Some(Box::new(static_provider)))
            .build()
            .map_err(|e| BlobError::ConnectionError(format!("Client creation failed: {}", e)))?;

        let service = Self { client, config };
        service.ensure_bucket_exists().await?;

        info!("MinIO service initialized");
        Ok(service)
    }

    #[instrument(skip(self))]
    async fn ensure_bucket_exists(&self) -> Result<(), BlobError> {
        let bucket_exists_args = BucketExistsArgs::new(&self.config.bucket_name)
            .map_err(|e| BlobError::InvalidArguments(e.to_string()))?;

        let exists = self
            .client
            .bucket_exists(&bucket_exists_args)
            .await
            .map_err(|e| BlobError::OperationError(format!("Bucket exists check failed: {}", e)))?;

        if exists {
            return Ok(());
        }

        warn!("Bucket '{}' does not exist, creating it", self.config.bucket_name);

        let make_bucket_args = MakeBucketArgs::new(&self.config.bucket_name)
            .map_err(|e| BlobError::InvalidArguments(e.to_string()))?;

        self.client
            .make_bucket(&make_bucket_args)
            .await
            .map_err(|e| BlobError::OperationError(format!("Bucket creation failed: {}", e)))?;

        info!("Created bucket '{}'", self.config.bucket_name);
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MinioService {
    #[instrument(skip(self, data), fields(object_name = %object_name, size = data.len()))]
    async fn put_object(
        &self,
        object_name: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), BlobError> {
        info!("Uploading object to bucket '{}'", self.config.bucket_name);

        let bucket_name = self.config.bucket_name.clone();
        let object_name_owned = object_name.to_string();
        let client = self.client.clone();
        let content_type_owned = content_type.map(|ct| ct.to_string());

        // The minio put path is blocking; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let mut reader = Cursor::new(data);
            let data_len = reader.get_ref().len();
            let ct_holder = content_type_owned;

            let mut args = PutObjectArgs::new(
                &bucket_name,
                &object_name_owned,
                &mut reader,
                Some(data_len),
                None,
            )
            .map_err(|e| BlobError::InvalidArguments(e.to_string()))?;

            if let Some(ref ct) = ct_holder {
                args.content_type = ct;
            }

            futures::executor::block_on(client.put_object(&mut args))
                .map_err(|e| BlobError::OperationError(format!("Upload failed: {}", e)))?;

            info!("Uploaded object '{}'", &object_name_owned);
            Ok(())
        })
        .await
        .map_err(|e| {
            error!("Failed to join blocking task for put_object: {}", e);
            BlobError::OperationError(format!("Join error: {}", e))
        })??;
        Ok(())
    }

    #[instrument(skip(self), fields(object_name = %object_name))]
    async fn remove_object(&self, object_name: &str) -> Result<(), BlobError> {
        let args = RemoveObjectArgs::new(&self.config.bucket_name, object_name)
            .map_err(|e| BlobError::InvalidArguments(e.to_string()))?;

        self.client
            .remove_object(&args)
            .await
            .map_err(|e| BlobError::OperationError(format!("Delete failed: {}", e)))?;

        info!("Deleted object '{}'", object_name);
        Ok(())
    }

    fn download_link(&self, object_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.links_prefix.trim_end_matches('/'),
            self.config.bucket_name,
            object_name
        )
    }
}
