//! FIRDS data models

use serde::{Deserialize, Serialize};

/// Local name of the element holding one instrument's general attributes
pub const INSTRUMENT_ELEMENT: &str = "FinInstrmGnlAttrbts";

/// Child elements read from every instrument element, in output column order
pub const INSTRUMENT_FIELD_TAGS: [&str; 6] =
    ["Id", "FullNm", "ClssfctnTp", "CmmdtyDerivInd", "NtnlCcy", "Issr"];

/// CSV header row; column `i` holds the value of `INSTRUMENT_FIELD_TAGS[i]`
pub const CSV_HEADER: [&str; 6] = [
    "FinInstrmGnlAttrbts.Id",
    "FinInstrmGnlAttrbts.FullNm",
    "FinInstrmGnlAttrbts.ClssfctnTp",
    "FinInstrmGnlAttrbts.CmmdtyDerivInd",
    "FinInstrmGnlAttrbts.NtnlCcy",
    "Issr",
];

/// A published file listed in the FIRDS metadata feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// Download URL of the published archive
    pub location: String,

    /// Published file type tag (e.g. "DLTINS", "FULINS")
    pub file_type: String,
}

impl CandidateFile {
    pub fn new(location: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            file_type: file_type.into(),
        }
    }
}

/// One flattened `FinInstrmGnlAttrbts` element
///
/// Field order is the CSV column order. Serde names match [`CSV_HEADER`], so a
/// produced table can be read back with `csv::Reader::deserialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    #[serde(rename = "FinInstrmGnlAttrbts.Id")]
    pub id: String,

    #[serde(rename = "FinInstrmGnlAttrbts.FullNm")]
    pub full_name: String,

    #[serde(rename = "FinInstrmGnlAttrbts.ClssfctnTp")]
    pub classification_type: String,

    #[serde(rename = "FinInstrmGnlAttrbts.CmmdtyDerivInd")]
    pub commodity_derivative_indicator: String,

    #[serde(rename = "FinInstrmGnlAttrbts.NtnlCcy")]
    pub notional_currency: String,

    #[serde(rename = "Issr")]
    pub issuer: String,
}

impl InstrumentRecord {
    /// Build a record from values ordered like [`INSTRUMENT_FIELD_TAGS`]
    pub fn from_values(values: [String; 6]) -> Self {
        let [
            id,
            full_name,
            classification_type,
            commodity_derivative_indicator,
            notional_currency,
            issuer,
        ] = values;

        Self {
            id,
            full_name,
            classification_type,
            commodity_derivative_indicator,
            notional_currency,
            issuer,
        }
    }

    /// Field values in column order
    pub fn values(&self) -> [&str; 6] {
        [
            &self.id,
            &self.full_name,
            &self.classification_type,
            &self.commodity_derivative_indicator,
            &self.notional_currency,
            &self.issuer,
        ]
    }
}
