//! Selection of the source file to download

use crate::error::{IngestError, Result};
use crate::models::CandidateFile;
use tracing::{info, warn};

/// Return the location of the first candidate whose file type equals `required_type`
///
/// Comparison is exact and case-sensitive. When several candidates qualify the
/// first one in feed order wins and a warning records how many were passed over.
pub fn select_download_target<'a>(
    feed_entries: &'a [CandidateFile],
    required_type: &str,
) -> Result<&'a str> {
    let mut matching = feed_entries
        .iter()
        .filter(|candidate| candidate.file_type == required_type);

    let selected = matching.next().ok_or_else(|| {
        IngestError::NotFound(format!(
            "no file with type {} among {} feed entries",
            required_type,
            feed_entries.len()
        ))
    })?;

    let skipped = matching.count();
    if skipped > 0 {
        warn!(
            file_type = required_type,
            skipped,
            location = %selected.location,
            "Several files qualify; using the first in feed order"
        );
    }

    info!(file_type = required_type, location = %selected.location, "Selected source file");
    Ok(&selected.location)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn feed(types: &[&str]) -> Vec<CandidateFile> {
        types
            .iter()
            .enumerate()
            .map(|(i, file_type)| {
                CandidateFile::new(format!("http://example.test/{i}.zip"), *file_type)
            })
            .collect()
    }

    #[test]
    fn test_single_match_found_at_any_position() {
        for position in 0..4 {
            let mut types = vec!["FULINS", "FULCAN", "FULINS"];
            types.insert(position, "DLTINS");
            let entries = feed(&types);

            let location = select_download_target(&entries, "DLTINS").unwrap();
            assert_eq!(location, format!("http://example.test/{position}.zip"));
        }
    }

    #[test]
    fn test_no_match_is_not_found() {
        let entries = feed(&["FULINS", "FULCAN"]);
        let err = select_download_target(&entries, "DLTINS").unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }

    #[test]
    fn test_empty_feed_is_not_found() {
        assert!(matches!(
            select_download_target(&[], "DLTINS"),
            Err(IngestError::NotFound(_))
        ));
    }

    #[test]
    fn test_first_match_wins() {
        let entries = feed(&["FULINS", "DLTINS", "DLTINS"]);
        assert_eq!(
            select_download_target(&entries, "DLTINS").unwrap(),
            "http://example.test/1.zip"
        );
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let entries = feed(&["dltins"]);
        assert!(select_download_target(&entries, "DLTINS").is_err());
    }
}
