//! Error types for FIRDS ingestion
//!
//! Every pipeline stage returns [`IngestError`] and fails fast. Nothing is
//! recovered locally: a missing source file, an unreadable archive, or a record
//! without one of its required fields ends the run before anything is uploaded.

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Main error type for FIRDS ingestion
#[derive(Error, Debug)]
pub enum IngestError {
    /// No feed entry or archive member satisfied the selection predicate
    #[error("Not found: {0}")]
    NotFound(String),

    /// The downloaded bytes are not a readable zip archive
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// The document contains no element with the requested local name
    #[error("No <{element}> elements found in document")]
    NoMatch { element: String },

    /// A matched element lacks one of its required direct children
    #[error("Element #{element_index} is missing required field <{field}>")]
    MissingField { element_index: usize, field: String },

    /// HTTP or object storage call failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Markup that parses but ends before a matched element closes
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Short class name used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::NotFound(_) => "not_found",
            IngestError::CorruptArchive(_) => "corrupt_archive",
            IngestError::NoMatch { .. } => "no_match",
            IngestError::MissingField { .. } => "missing_field",
            IngestError::Transport(_) => "transport",
            IngestError::Malformed(_) => "malformed",
            IngestError::Xml(_) => "xml",
            IngestError::Csv(_) => "csv",
            IngestError::Io(_) => "io",
            IngestError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Transport(err.to_string())
    }
}

// Archives are always read from memory, so zip I/O failures mean truncated data
impl From<zip::result::ZipError> for IngestError {
    fn from(err: zip::result::ZipError) -> Self {
        IngestError::CorruptArchive(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for IngestError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        IngestError::Xml(err.into())
    }
}
