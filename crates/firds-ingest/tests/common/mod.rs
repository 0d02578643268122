//! Shared fixtures for firds-ingest integration tests
//!
//! Provides an in-memory [`ObjectSink`], a mock FIRDS register built on
//! wiremock, and builders for feed documents and DLTINS archives.

#![allow(dead_code)]

use async_trait::async_trait;
use firds_ingest::storage::{ObjectSink, UploadResult};
use firds_ingest::{IngestError, Result};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

pub const TEST_BUCKET: &str = "firds-test";

/// Header row every produced table starts with
pub const EXPECTED_HEADER: &str = "FinInstrmGnlAttrbts.Id,FinInstrmGnlAttrbts.FullNm,\
FinInstrmGnlAttrbts.ClssfctnTp,FinInstrmGnlAttrbts.CmmdtyDerivInd,FinInstrmGnlAttrbts.NtnlCcy,Issr";

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,firds_ingest=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// An uploaded object as seen by [`MemorySink`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// [`ObjectSink`] that keeps objects in memory, optionally failing every upload
#[derive(Default)]
pub struct MemorySink {
    objects: Mutex<HashMap<String, StoredObject>>,
    uploads: Mutex<usize>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn upload_count(&self) -> usize {
        *self.uploads.lock().unwrap()
    }
}

#[async_trait]
impl ObjectSink for MemorySink {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<UploadResult> {
        if self.fail {
            return Err(IngestError::Transport("bucket unreachable".to_string()));
        }

        *self.uploads.lock().unwrap() += 1;
        let result = UploadResult {
            bucket: TEST_BUCKET.to_string(),
            key: key.to_string(),
            size: body.len(),
            checksum: firds_common::checksum::sha256_hex(&body),
        };

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );

        Ok(result)
    }
}

// ============================================================================
// Document Fixtures
// ============================================================================

/// One `FinInstrmGnlAttrbts` element with all six fields
pub fn instrument(id: &str, name: &str, issuer: &str) -> String {
    format!(
        "<FinInstrmGnlAttrbts><Id>{id}</Id><FullNm>{name}</FullNm><ShrtNm>{id}</ShrtNm>\
         <ClssfctnTp>DBFTFR</ClssfctnTp><NtnlCcy>EUR</NtnlCcy>\
         <CmmdtyDerivInd>false</CmmdtyDerivInd><Issr>{issuer}</Issr></FinInstrmGnlAttrbts>"
    )
}

/// A DLTINS document wrapping the given instrument elements
pub fn dltins_document(instruments: &[String]) -> String {
    let body: String = instruments
        .iter()
        .map(|attrs| format!("<TermntdRcrd>{attrs}</TermntdRcrd>"))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<BizData xmlns="urn:iso:std:iso:20022:tech:xsd:head.003.001.01">
  <Hdr><AppHdr xmlns="urn:iso:std:iso:20022:tech:xsd:head.001.001.01"><MsgDefIdr>auth.036.001.02</MsgDefIdr></AppHdr></Hdr>
  <Pyld>
    <Document xmlns="urn:iso:std:iso:20022:tech:xsd:auth.036.001.02">
      <FinInstrmRptgRefDataDltaRpt><FinInstrm>{body}</FinInstrm></FinInstrmRptgRefDataDltaRpt>
    </Document>
  </Pyld>
</BizData>"#
    )
}

/// The two-instrument sample used across end-to-end tests
pub fn sample_document() -> String {
    dltins_document(&[
        instrument("X1", "Bond one", "529900W18LQJJN6SJ336"),
        instrument("X2", "Bond two", "549300JSX0Z4CW0V5023"),
    ])
}

/// Zip archive holding the given members
pub fn zip_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in members {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Sitemap-shaped feed listing `(location, file_type)` entries
pub fn feed_document(entries: &[(String, &str)]) -> String {
    let urls: String = entries
        .iter()
        .map(|(location, file_type)| {
            format!(
                "<url><loc>{location}</loc><news:news><news:file_type>{file_type}</news:file_type></news:news></url>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:news="http://www.google.com/schemas/sitemap-news/0.9">{urls}</urlset>"#
    )
}

// ============================================================================
// Mock Register
// ============================================================================

pub const FEED_PATH: &str = "/solr/esma_registers_firds_files/select";
pub const ARCHIVE_PATH: &str = "/firds/DLTINS_20210117_01of01.zip";

/// Mock register serving a feed with a `FULINS` entry followed by one `DLTINS`
/// entry, and `archive` at the `DLTINS` location
pub async fn mock_register(archive: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;

    let feed = feed_document(&[
        (format!("{}/firds/FULINS_C_20210117_01of01.zip", server.uri()), "FULINS"),
        (format!("{}{}", server.uri(), ARCHIVE_PATH), "DLTINS"),
    ]);

    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ARCHIVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(&server)
        .await;

    server
}

pub fn feed_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), FEED_PATH)
}
