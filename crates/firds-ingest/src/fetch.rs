//! HTTP retrieval of the feed and the selected archive

use crate::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("firds-ingest/", env!("CARGO_PKG_VERSION"));

/// Source of raw bytes by URL
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Return the complete response body for `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`Fetch`] over HTTP(S) with a single GET and no retry
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Transport(format!("GET {} returned {}", url, status)));
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "Fetched response body");

        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/a.zip"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4b, 0x05, 0x06]))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5).unwrap();
        let body = fetcher.fetch(&format!("{}/files/a.zip", server.uri())).await.unwrap();

        assert_eq!(body, vec![0x50, 0x4b, 0x05, 0x06]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5).unwrap();
        let err = fetcher.fetch(&format!("{}/feed", server.uri())).await.unwrap_err();

        assert!(matches!(err, IngestError::Transport(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let fetcher = HttpFetcher::new(2).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/feed").await.unwrap_err();

        assert!(matches!(err, IngestError::Transport(_)));
    }
}
