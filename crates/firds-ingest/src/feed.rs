//! Parsing of the FIRDS file-list feed
//!
//! The ESMA register answers file-list queries in one of two shapes, and both
//! are accepted. Matching is on local names, so namespace prefixes do not matter.
//!
//! Sitemap shape, one `url` element per published file:
//!
//! ```xml
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>http://firds.esma.europa.eu/firds/DLTINS_20210117_01of01.zip</loc>
//!     <news><file_type>DLTINS</file_type></news>
//!   </url>
//! </urlset>
//! ```
//!
//! Solr shape, one `doc` element per published file:
//!
//! ```xml
//! <response><result>
//!   <doc>
//!     <str name="file_type">DLTINS</str>
//!     <str name="download_link">http://firds.esma.europa.eu/firds/DLTINS_20210117_01of01.zip</str>
//!   </doc>
//! </result></response>
//! ```

use crate::error::Result;
use crate::models::CandidateFile;
use crate::transformer::cdata_text;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Location,
    FileType,
}

#[derive(Default)]
struct EntryBuilder {
    depth: usize,
    location: Option<String>,
    file_type: Option<String>,
    capture: Option<(Slot, usize, String)>,
}

impl EntryBuilder {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    fn set(&mut self, slot: Slot, value: String) {
        let target = match slot {
            Slot::Location => &mut self.location,
            Slot::FileType => &mut self.file_type,
        };
        if target.is_none() {
            *target = Some(value);
        }
    }

    fn build(self) -> Option<CandidateFile> {
        match (self.location, self.file_type) {
            (Some(location), Some(file_type)) if !location.is_empty() => {
                Some(CandidateFile { location, file_type })
            },
            (location, file_type) => {
                debug!(?location, ?file_type, "Skipping incomplete feed entry");
                None
            },
        }
    }
}

/// Which value, if any, an element inside an entry carries
fn slot_for(element: &BytesStart<'_>) -> Result<Option<Slot>> {
    match element.local_name().as_ref() {
        b"loc" => Ok(Some(Slot::Location)),
        b"file_type" => Ok(Some(Slot::FileType)),
        b"str" => {
            for attr in element.attributes() {
                let attr = attr?;
                if attr.key.local_name().as_ref() == b"name" {
                    return Ok(match attr.unescape_value()?.as_ref() {
                        "download_link" => Some(Slot::Location),
                        "file_type" => Some(Slot::FileType),
                        _ => None,
                    });
                }
            }
            Ok(None)
        },
        _ => Ok(None),
    }
}

fn is_entry(element: &BytesStart<'_>) -> bool {
    matches!(element.local_name().as_ref(), b"url" | b"doc")
}

/// Parse a feed document into candidate files, in document order
///
/// Entries lacking a location or a file type are skipped: they could never be
/// selected. Markup errors fail with [`crate::IngestError::Xml`], and CDATA
/// that is not UTF-8 with [`crate::IngestError::Malformed`].
#[instrument(skip(document), fields(bytes = document.len()))]
pub fn parse_feed(document: &[u8]) -> Result<Vec<CandidateFile>> {
    let mut reader = Reader::from_reader(document);
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut entry: Option<EntryBuilder> = None;
    let mut candidates = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                match entry.as_mut() {
                    None if is_entry(&e) => entry = Some(EntryBuilder::new(depth)),
                    Some(current) if current.capture.is_none() => {
                        if let Some(slot) = slot_for(&e)? {
                            current.capture = Some((slot, depth, String::new()));
                        }
                    },
                    _ => {},
                }
            },

            Event::Text(e) => {
                if let Some((_, capture_depth, text)) =
                    entry.as_mut().and_then(|current| current.capture.as_mut())
                {
                    if *capture_depth == depth {
                        text.push_str(&e.unescape()?);
                    }
                }
            },

            Event::CData(e) => {
                if let Some((_, capture_depth, text)) =
                    entry.as_mut().and_then(|current| current.capture.as_mut())
                {
                    if *capture_depth == depth {
                        text.push_str(cdata_text(&e)?);
                    }
                }
            },

            Event::End(_) => {
                if let Some(current) = entry.as_mut() {
                    if current.capture.as_ref().is_some_and(|(_, d, _)| *d == depth) {
                        if let Some((slot, _, text)) = current.capture.take() {
                            current.set(slot, text.trim().to_string());
                        }
                    }
                }

                if entry.as_ref().is_some_and(|current| current.depth == depth) {
                    if let Some(candidate) = entry.take().and_then(EntryBuilder::build) {
                        candidates.push(candidate);
                    }
                }

                depth = depth.saturating_sub(1);
            },

            Event::Eof => break,
            _ => {},
        }

        buf.clear();
    }

    debug!(candidates = candidates.len(), "Parsed file-list feed");
    Ok(candidates)
}
