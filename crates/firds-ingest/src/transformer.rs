//! Flattening of namespaced FIRDS XML records into rows
//!
//! FIRDS documents have been published under more than one ISO 20022 head
//! namespace (`head.001.001.01`, `head.003.001.01`) with structurally identical
//! payloads, so elements are matched on their local name only. Any prefix or
//! namespace URI on the document side, or on the requested tag names, is ignored.
//!
//! The document is streamed with `quick_xml::Reader`; only the values of the
//! requested fields are kept in memory.

use crate::error::{IngestError, Result};
use crate::models::{InstrumentRecord, INSTRUMENT_ELEMENT, INSTRUMENT_FIELD_TAGS};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument};

/// Strip a namespace prefix (`ns:Tag`) or Clark-notation URI (`{urn:...}Tag`)
pub(crate) fn local_part(tag: &str) -> &str {
    let tag = tag.rsplit_once('}').map_or(tag, |(_, local)| local);
    tag.rsplit_once(':').map_or(tag, |(_, local)| local)
}

/// CDATA content as UTF-8; invalid bytes fail like they do in plain text
pub(crate) fn cdata_text(content: &[u8]) -> Result<&str> {
    std::str::from_utf8(content)
        .map_err(|e| IngestError::Malformed(format!("CDATA section is not valid UTF-8: {}", e)))
}

/// Text capture of one field child in progress
struct Capture {
    field: usize,
    depth: usize,
    text: String,
    /// Set once a nested element starts; only leading text counts as the value
    sealed: bool,
}

/// A matched element whose end tag has not been seen yet
struct OpenElement {
    index: usize,
    depth: usize,
    values: Vec<Option<String>>,
    capture: Option<Capture>,
}

impl OpenElement {
    fn new(index: usize, depth: usize, field_count: usize) -> Self {
        Self {
            index,
            depth,
            values: vec![None; field_count],
            capture: None,
        }
    }

    /// Position of `name` among the fields still waiting for a value
    fn pending_field(&self, fields: &[&str], name: &[u8]) -> Option<usize> {
        fields
            .iter()
            .position(|field| field.as_bytes() == name)
            .filter(|&i| self.values[i].is_none())
    }

    fn finish(self, fields: &[&str]) -> Result<(usize, Vec<String>)> {
        let mut row = Vec::with_capacity(self.values.len());
        for (value, field) in self.values.into_iter().zip(fields) {
            match value {
                Some(value) => row.push(value),
                None => {
                    return Err(IngestError::MissingField {
                        element_index: self.index,
                        field: field.to_string(),
                    })
                },
            }
        }
        Ok((self.index, row))
    }
}

/// Extract one row per `element_tag` element, with one column per `field_tags` entry
///
/// Every element in the document whose local name equals `element_tag` yields a
/// row, in document order. Column `i` is the text of the first direct child whose
/// local name equals `field_tags[i]`; text after a nested child element is not
/// part of the value, and surrounding whitespace is trimmed. A present but empty
/// child yields an empty string.
///
/// # Errors
///
/// - [`IngestError::MissingField`] when a matched element has no such child;
///   the index is the element's 0-based position in document order
/// - [`IngestError::NoMatch`] when no element matches at all
/// - [`IngestError::Xml`] for malformed markup
/// - [`IngestError::Malformed`] when the document ends inside a matched element,
///   or a field's CDATA is not valid UTF-8
#[instrument(skip(document), fields(bytes = document.len()))]
pub fn to_records(
    document: &[u8],
    element_tag: &str,
    field_tags: &[&str],
) -> Result<Vec<Vec<String>>> {
    let element = local_part(element_tag);
    let fields: Vec<&str> = field_tags.iter().map(|tag| local_part(tag)).collect();

    let mut reader = Reader::from_reader(document);
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut open: Vec<OpenElement> = Vec::new();
    let mut rows: Vec<Option<Vec<String>>> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                let name = e.local_name();
                let name = name.as_ref();

                seal_captures(&mut open, depth);

                if let Some(parent) = open.last_mut() {
                    if parent.capture.is_none() && depth == parent.depth + 1 {
                        if let Some(field) = parent.pending_field(&fields, name) {
                            parent.capture = Some(Capture {
                                field,
                                depth,
                                text: String::new(),
                                sealed: false,
                            });
                        }
                    }
                }

                if name == element.as_bytes() {
                    open.push(OpenElement::new(rows.len(), depth, fields.len()));
                    rows.push(None);
                }
            },

            Event::Empty(e) => {
                let child_depth = depth + 1;
                let name = e.local_name();
                let name = name.as_ref();

                seal_captures(&mut open, child_depth);

                if let Some(parent) = open.last_mut() {
                    if parent.capture.is_none() && child_depth == parent.depth + 1 {
                        if let Some(field) = parent.pending_field(&fields, name) {
                            parent.values[field] = Some(String::new());
                        }
                    }
                }

                if name == element.as_bytes() {
                    let matched = OpenElement::new(rows.len(), child_depth, fields.len());
                    rows.push(None);
                    let (index, row) = matched.finish(&fields)?;
                    rows[index] = Some(row);
                }
            },

            Event::Text(e) => {
                if let Some(capture) = active_capture(&mut open, depth) {
                    capture.text.push_str(&e.unescape()?);
                }
            },

            Event::CData(e) => {
                if let Some(capture) = active_capture(&mut open, depth) {
                    capture.text.push_str(cdata_text(&e)?);
                }
            },

            Event::End(_) => {
                if let Some(current) = open.last_mut() {
                    if current.capture.as_ref().is_some_and(|c| c.depth == depth) {
                        if let Some(capture) = current.capture.take() {
                            current.values[capture.field] = Some(capture.text.trim().to_string());
                        }
                    }
                }

                if open.last().is_some_and(|current| current.depth == depth) {
                    if let Some(current) = open.pop() {
                        let (index, row) = current.finish(&fields)?;
                        rows[index] = Some(row);
                    }
                }

                depth = depth.saturating_sub(1);
            },

            Event::Eof => break,
            _ => {},
        }

        buf.clear();
    }

    if let Some(unclosed) = open.first() {
        return Err(IngestError::Malformed(format!(
            "document ended inside <{}> #{}",
            element, unclosed.index
        )));
    }

    if rows.is_empty() {
        return Err(IngestError::NoMatch {
            element: element.to_string(),
        });
    }

    let rows: Vec<Vec<String>> = rows.into_iter().flatten().collect();
    debug!(element, rows = rows.len(), "Flattened document");

    Ok(rows)
}

/// Flatten every `FinInstrmGnlAttrbts` element of a FIRDS document
pub fn to_instrument_records(document: &[u8]) -> Result<Vec<InstrumentRecord>> {
    let rows = to_records(document, INSTRUMENT_ELEMENT, &INSTRUMENT_FIELD_TAGS)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let mut values = row.into_iter();
            InstrumentRecord::from_values(std::array::from_fn(|_| {
                values.next().unwrap_or_default()
            }))
        })
        .collect())
}

/// A child element opened at `depth` ends the leading text of any capture above it
fn seal_captures(open: &mut [OpenElement], depth: usize) {
    for capture in open.iter_mut().filter_map(|o| o.capture.as_mut()) {
        if capture.depth < depth {
            capture.sealed = true;
        }
    }
}

fn active_capture(open: &mut [OpenElement], depth: usize) -> Option<&mut Capture> {
    open.last_mut()
        .and_then(|current| current.capture.as_mut())
        .filter(|capture| capture.depth == depth && !capture.sealed)
}
