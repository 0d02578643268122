//! Invocation entry point

use crate::config::IngestConfig;
use crate::error::Result;
use crate::fetch::{Fetch, HttpFetcher};
use crate::pipeline::FirdsPipeline;
use crate::storage::{ObjectSink, S3Storage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Body returned by every successful invocation.
pub const SUCCESS_BODY: &str = "CSV file successfully uploaded to S3";

/// Reply to an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn success() -> Self {
        Self {
            status_code: 200,
            body: SUCCESS_BODY.to_string(),
        }
    }
}

/// Run the pipeline once with the given collaborators
///
/// The event is opaque; it is only logged. Errors come back unchanged.
pub async fn handle_with(
    event: &serde_json::Value,
    config: &IngestConfig,
    fetcher: &dyn Fetch,
    sink: &dyn ObjectSink,
) -> Result<HandlerResponse> {
    let run_id = Uuid::new_v4();
    let span = info_span!("invocation", %run_id);

    async move {
        debug!(%event, "Received event");

        let started = chrono::Utc::now();
        let summary = FirdsPipeline::new(fetcher, sink, config)
            .run()
            .await
            .inspect_err(|e| debug!(kind = e.kind(), "Run failed"))?;

        info!(
            source_url = %summary.source_url,
            member = %summary.member_name,
            records = summary.record_count,
            key = %summary.upload.key,
            checksum = %summary.upload.checksum,
            elapsed_ms = (chrono::Utc::now() - started).num_milliseconds(),
            "Run completed"
        );

        Ok(HandlerResponse::success())
    }
    .instrument(span)
    .await
}

/// Run the pipeline once against HTTP and S3 clients built for this invocation
pub async fn handle(event: &serde_json::Value, config: &IngestConfig) -> Result<HandlerResponse> {
    let fetcher = HttpFetcher::new(config.http_timeout_secs)?;
    let storage = S3Storage::new(&config.storage).await;

    handle_with(event, config, &fetcher, &storage).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_shape() {
        let json = serde_json::to_value(HandlerResponse::success()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "statusCode": 200,
                "body": "CSV file successfully uploaded to S3"
            })
        );
    }
}
