//! CSV serialization of instrument records

use crate::error::Result;
use crate::models::{InstrumentRecord, CSV_HEADER};

/// Content type used when the table is uploaded
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Serialize records as CSV: the header row, then one row per record in order
///
/// Lines end with `\n`. Values containing commas, quotes, or line breaks are
/// quoted. Output depends only on the records, so identical input gives
/// byte-identical tables.
pub fn write_csv(records: &[InstrumentRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}
