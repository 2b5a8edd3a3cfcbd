pub mod error;
pub mod jwt;
pub mod logger;
pub mod minio;
pub mod stripe;
