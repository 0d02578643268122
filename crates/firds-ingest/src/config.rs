//! Configuration management

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Source Constants
// ============================================================================

/// ESMA FIRDS file-list query covering the publications of 17-19 January 2021.
pub const DEFAULT_FEED_URL: &str = "https://registers.esma.europa.eu/solr/esma_registers_firds_files/select?q=*&fq=publication_date:%5B2021-01-17T00:00:00Z+TO+2021-01-19T23:59:59Z%5D&wt=xml&indent=true&start=0&rows=100";

/// Published file type carrying instrument deltas.
pub const REQUIRED_FILE_TYPE: &str = "DLTINS";

/// Archive members must end with this suffix.
pub const MEMBER_SUFFIX: &str = ".xml";

// ============================================================================
// Runtime Defaults
// ============================================================================

/// Default object key of the uploaded table.
pub const DEFAULT_OUTPUT_KEY: &str = "output.csv";

/// Default per-request HTTP timeout in seconds. DLTINS archives run to tens of MB.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Ingest job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub feed_url: String,
    pub output_key: String,
    pub http_timeout_secs: u64,
    pub storage: StorageConfig,
}

/// Destination object store
///
/// Credentials are not configured here; the AWS default provider chain
/// supplies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    /// Custom endpoint for S3-compatible stores such as MinIO
    pub endpoint: Option<String>,
    /// Region override; the ambient AWS configuration applies when unset
    pub region: Option<String>,
    pub path_style: bool,
}

impl StorageConfig {
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: None,
            region: None,
            path_style: false,
        }
    }
}

impl IngestConfig {
    /// Configuration with defaults for everything but the bucket
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            output_key: DEFAULT_OUTPUT_KEY.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            storage: StorageConfig::for_bucket(bucket),
        }
    }

    /// Load configuration from the process environment (and `.env`, if present)
    ///
    /// Environment variables:
    /// - `S3_BUCKET` (required): destination bucket
    /// - `S3_KEY`: destination key, default `output.csv`
    /// - `FIRDS_FEED_URL`: file-list query URL
    /// - `FIRDS_HTTP_TIMEOUT_SECS`: per-request timeout
    /// - `S3_ENDPOINT`, `S3_REGION`, `S3_PATH_STYLE`: object store addressing
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bucket = lookup("S3_BUCKET")
            .ok_or_else(|| IngestError::Config("S3_BUCKET must be set".to_string()))?;

        let http_timeout_secs = match lookup("FIRDS_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                IngestError::Config(format!("FIRDS_HTTP_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let config = Self {
            feed_url: lookup("FIRDS_FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            output_key: lookup("S3_KEY").unwrap_or_else(|| DEFAULT_OUTPUT_KEY.to_string()),
            http_timeout_secs,
            storage: StorageConfig {
                bucket,
                endpoint: lookup("S3_ENDPOINT"),
                region: lookup("S3_REGION"),
                path_style: lookup("S3_PATH_STYLE")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(false),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.trim().is_empty() {
            return Err(IngestError::Config("S3_BUCKET cannot be empty".to_string()));
        }

        if self.output_key.trim().is_empty() {
            return Err(IngestError::Config("S3_KEY cannot be empty".to_string()));
        }

        if !(self.feed_url.starts_with("http://") || self.feed_url.starts_with("https://")) {
            return Err(IngestError::Config(format!(
                "FIRDS_FEED_URL must be an http(s) URL: {}",
                self.feed_url
            )));
        }

        if self.http_timeout_secs == 0 {
            return Err(IngestError::Config(
                "FIRDS_HTTP_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_bucket_only() {
        let config = IngestConfig::from_lookup(lookup(&[("S3_BUCKET", "firds-out")])).unwrap();

        assert_eq!(config.storage.bucket, "firds-out");
        assert_eq!(config.output_key, DEFAULT_OUTPUT_KEY);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.storage.endpoint, None);
        assert!(!config.storage.path_style);
    }

    #[test]
    fn test_missing_bucket_is_config_error() {
        let err = IngestConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let config = IngestConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "firds-out"),
            ("S3_KEY", "firds/2021-01-17.csv"),
            ("FIRDS_FEED_URL", "http://localhost:8080/feed"),
            ("FIRDS_HTTP_TIMEOUT_SECS", "30"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("S3_PATH_STYLE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.output_key, "firds/2021-01-17.csv");
        assert_eq!(config.feed_url, "http://localhost:8080/feed");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(config.storage.path_style);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for vars in [
            vec![("S3_BUCKET", " ")],
            vec![("S3_BUCKET", "b"), ("S3_KEY", "")],
            vec![("S3_BUCKET", "b"), ("FIRDS_FEED_URL", "ftp://example.test/feed")],
            vec![("S3_BUCKET", "b"), ("FIRDS_HTTP_TIMEOUT_SECS", "0")],
            vec![("S3_BUCKET", "b"), ("FIRDS_HTTP_TIMEOUT_SECS", "soon")],
        ] {
            assert!(
                IngestConfig::from_lookup(lookup(&vars)).is_err(),
                "accepted {:?}",
                vars
            );
        }
    }
}
