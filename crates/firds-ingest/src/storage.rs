//! Object storage for the produced table

use crate::config::StorageConfig;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use firds_common::checksum::sha256_hex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub bucket: String,
    pub key: String,
    pub size: usize,
    /// Hex SHA-256 of the uploaded body
    pub checksum: String,
}

/// Destination for the produced table
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Store `body` under `key`, replacing any existing object
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<UploadResult>;
}

/// [`ObjectSink`] backed by S3 or an S3-compatible store
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Build a client from the ambient AWS configuration plus the overrides in `config`
    pub async fn new(config: &StorageConfig) -> Self {
        debug!(?config, "Initializing storage");

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            s3_config = s3_config.endpoint_url(endpoint);
        }

        info!(bucket = %config.bucket, "Storage client initialized");

        Self {
            client: Client::from_conf(s3_config.build()),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectSink for S3Storage {
    #[instrument(skip(self, body), fields(bucket = %self.bucket, bytes = body.len()))]
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<UploadResult> {
        let checksum = sha256_hex(&body);
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                IngestError::Transport(format!(
                    "failed to upload s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        info!("Uploaded s3://{}/{} ({} bytes)", self.bucket, key, size);

        Ok(UploadResult {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            size,
            checksum,
        })
    }
}
