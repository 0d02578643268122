//! FIRDS ingestion pipeline
//!
//! One run walks the stages strictly in order:
//!
//! 1. fetch the file-list feed and parse its entries
//! 2. select the first `DLTINS` file and download its archive
//! 3. extract the `DLTINS*.xml` member
//! 4. flatten every `FinInstrmGnlAttrbts` element into a record
//! 5. serialize the records as CSV and upload the table
//!
//! The first failing stage ends the run. The upload is the last stage, so a
//! failed run never leaves a partial table behind.

use crate::config::{IngestConfig, MEMBER_SUFFIX, REQUIRED_FILE_TYPE};
use crate::error::Result;
use crate::extractor::extract_member;
use crate::feed::parse_feed;
use crate::fetch::Fetch;
use crate::locator::select_download_target;
use crate::storage::{ObjectSink, UploadResult};
use crate::table::{write_csv, CSV_CONTENT_TYPE};
use crate::transformer::to_instrument_records;
use firds_common::checksum::sha256_hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{error, info, instrument};

/// Named step of a run, used as a log field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Feed,
    Locate,
    Download,
    Extract,
    Transform,
    Serialize,
    Upload,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Feed => "feed",
            Stage::Locate => "locate",
            Stage::Download => "download",
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Serialize => "serialize",
            Stage::Upload => "upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log a stage failure and pass the error through unchanged
fn at_stage<T>(stage: Stage, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| error!(stage = %stage, kind = e.kind(), error = %e, "Stage failed"))
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Archive location chosen from the feed
    pub source_url: String,
    /// Archive member that was transformed
    pub member_name: String,
    pub record_count: usize,
    pub upload: UploadResult,
}

/// A CSV table built from one FIRDS document
#[derive(Debug, Clone)]
pub struct Table {
    pub record_count: usize,
    pub bytes: Vec<u8>,
}

/// Flatten a FIRDS document and serialize the records as CSV
pub fn transform_document(document: &[u8]) -> Result<Table> {
    let records = at_stage(Stage::Transform, to_instrument_records(document))?;
    let bytes = at_stage(Stage::Serialize, write_csv(&records))?;

    Ok(Table {
        record_count: records.len(),
        bytes,
    })
}

/// Remote run of all stages against injected collaborators
pub struct FirdsPipeline<'a> {
    fetcher: &'a dyn Fetch,
    sink: &'a dyn ObjectSink,
    feed_url: String,
    output_key: String,
}

impl<'a> FirdsPipeline<'a> {
    pub fn new(fetcher: &'a dyn Fetch, sink: &'a dyn ObjectSink, config: &IngestConfig) -> Self {
        Self {
            fetcher,
            sink,
            feed_url: config.feed_url.clone(),
            output_key: config.output_key.clone(),
        }
    }

    /// Execute every stage in order
    #[instrument(skip(self), fields(feed_url = %self.feed_url, output_key = %self.output_key))]
    pub async fn run(&self) -> Result<RunSummary> {
        let feed = at_stage(Stage::Feed, self.fetcher.fetch(&self.feed_url).await)?;
        let candidates = at_stage(Stage::Feed, parse_feed(&feed))?;
        info!(candidates = candidates.len(), "Feed parsed");

        let source_url = at_stage(
            Stage::Locate,
            select_download_target(&candidates, REQUIRED_FILE_TYPE),
        )?
        .to_string();

        let archive = at_stage(Stage::Download, self.fetcher.fetch(&source_url).await)?;
        info!(source_url = %source_url, bytes = archive.len(), "Archive downloaded");

        let member = at_stage(
            Stage::Extract,
            extract_member(&archive, REQUIRED_FILE_TYPE, MEMBER_SUFFIX),
        )?;
        info!(member = %member.name, bytes = member.data.len(), "Member extracted");

        let table = transform_document(&member.data)?;
        info!(records = table.record_count, bytes = table.bytes.len(), "Table built");

        let upload = at_stage(
            Stage::Upload,
            self.sink
                .upload(&self.output_key, table.bytes, CSV_CONTENT_TYPE)
                .await,
        )?;

        Ok(RunSummary {
            source_url,
            member_name: member.name,
            record_count: table.record_count,
            upload,
        })
    }
}

// ============================================================================
// Local Conversion
// ============================================================================

/// Result of an offline conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSummary {
    /// Member read from a zip input; `None` for a plain document
    pub member_name: Option<String>,
    pub record_count: usize,
    pub checksum: String,
}

fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06")
}

/// Convert a local archive or document to a CSV file
///
/// A zip input goes through member extraction first; anything else is treated
/// as the FIRDS document itself. The output file is written only on success.
#[instrument]
pub async fn convert_local(input: &Path, output: &Path) -> Result<ConvertSummary> {
    let bytes = tokio::fs::read(input).await?;

    let (member_name, document) = if is_zip(&bytes) {
        let member = at_stage(
            Stage::Extract,
            extract_member(&bytes, REQUIRED_FILE_TYPE, MEMBER_SUFFIX),
        )?;
        (Some(member.name), member.data)
    } else {
        (None, bytes)
    };

    let table = transform_document(&document)?;
    let checksum = sha256_hex(&table.bytes);
    tokio::fs::write(output, &table.bytes).await?;

    info!(
        output = %output.display(),
        records = table.record_count,
        checksum = %checksum,
        "Wrote CSV table"
    );

    Ok(ConvertSummary {
        member_name,
        record_count: table.record_count,
        checksum,
    })
}
