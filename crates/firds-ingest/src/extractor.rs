//! Member extraction from downloaded zip archives

use crate::error::{IngestError, Result};
use std::io::{Cursor, Read};
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

/// A decompressed archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMember {
    /// Full member name inside the archive
    pub name: String,
    pub data: Vec<u8>,
}

fn open_archive(archive_bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| IngestError::CorruptArchive(format!("not a readable zip archive: {}", e)))
}

/// List file members (directories excluded) in central-directory order
pub fn list_members(archive_bytes: &[u8]) -> Result<Vec<String>> {
    let archive = open_archive(archive_bytes)?;

    Ok((0..archive.len())
        .filter_map(|i| archive.name_for_index(i))
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect())
}

/// Decompress the first member whose name contains `must_contain` and ends with `required_suffix`
///
/// Members are considered in central-directory order; directories never match.
/// The returned bytes are the member's content, uninterpreted.
#[instrument(skip(archive_bytes), fields(bytes = archive_bytes.len()))]
pub fn extract_member(
    archive_bytes: &[u8],
    must_contain: &str,
    required_suffix: &str,
) -> Result<ExtractedMember> {
    let mut archive = open_archive(archive_bytes)?;

    let matching: Vec<usize> = (0..archive.len())
        .filter(|&i| {
            archive.name_for_index(i).is_some_and(|name| {
                !name.ends_with('/')
                    && name.contains(must_contain)
                    && name.ends_with(required_suffix)
            })
        })
        .collect();

    let Some(&index) = matching.first() else {
        return Err(IngestError::NotFound(format!(
            "no archive member containing '{}' and ending with '{}' among {} entries",
            must_contain,
            required_suffix,
            archive.len()
        )));
    };

    let mut file = archive.by_index(index)?;
    let name = file.name().to_string();

    if matching.len() > 1 {
        warn!(
            member = %name,
            qualifying = matching.len(),
            "Several archive members qualify; using the first"
        );
    }

    let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut data)
        .map_err(|e| IngestError::CorruptArchive(format!("failed to inflate {}: {}", name, e)))?;

    debug!(member = %name, bytes = data.len(), "Extracted archive member");
    Ok(ExtractedMember { name, data })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in members {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(content).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_matching_member_bytes_unchanged() {
        let payload = b"<BizData>\n  <Pyld/>\n</BizData>\n".to_vec();
        let bytes = archive(&[
            ("README.txt", &b"not me"[..]),
            ("DLTINS_20210117_01of01.xml", payload.as_slice()),
        ]);

        let member = extract_member(&bytes, "DLTINS", ".xml").unwrap();
        assert_eq!(member.name, "DLTINS_20210117_01of01.xml");
        assert_eq!(member.data, payload);
    }

    #[test]
    fn test_both_predicates_required() {
        let bytes = archive(&[
            ("DLTINS_20210117.txt", &b"wrong suffix"[..]),
            ("FULINS_20210117.xml", &b"wrong marker"[..]),
        ]);

        let err = extract_member(&bytes, "DLTINS", ".xml").unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }

    #[test]
    fn test_first_qualifying_member_wins() {
        let bytes = archive(&[
            ("a-DLTINS.xml", &b"first"[..]),
            ("b-DLTINS.xml", &b"second"[..]),
        ]);

        let member = extract_member(&bytes, "DLTINS", ".xml").unwrap();
        assert_eq!(member.data, b"first");
    }

    #[test]
    fn test_directories_are_skipped() {
        let bytes = archive(&[("DLTINS.xml/", &b""[..]), ("data/sample-DLTINS.xml", &b"<x/>"[..])]);

        let member = extract_member(&bytes, "DLTINS", ".xml").unwrap();
        assert_eq!(member.name, "data/sample-DLTINS.xml");
        assert_eq!(list_members(&bytes).unwrap(), vec!["data/sample-DLTINS.xml".to_string()]);
    }

    #[test]
    fn test_non_zip_input_is_corrupt() {
        let err =
            extract_member(b"<html>Service Unavailable</html>", "DLTINS", ".xml").unwrap_err();
        assert!(matches!(err, IngestError::CorruptArchive(_)));
    }

    #[test]
    fn test_truncated_archive_is_corrupt() {
        let bytes = archive(&[("sample-DLTINS.xml", &b"<BizData/>"[..])]);
        let truncated = &bytes[..bytes.len() / 2];

        assert!(matches!(
            list_members(truncated),
            Err(IngestError::CorruptArchive(_))
        ));
    }
}
