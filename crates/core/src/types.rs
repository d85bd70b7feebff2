// Dataset types for the Skatteverket traktamente rowstore

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream column holding the country or region name.
pub const FIELD_COUNTRY: &str = "land eller område";
/// Upstream column holding the daily amount in SEK.
pub const FIELD_AMOUNT: &str = "normalbelopp";
/// Upstream column holding the year the rate applies to.
pub const FIELD_YEAR: &str = "år";
/// Upstream column holding the country code.
pub const FIELD_COUNTRY_CODE: &str = "landskod";

/// A scalar the upstream emits either as a JSON string or a JSON number.
///
/// The original kind is kept so rows serialize back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for TextOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for TextOrNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for TextOrNumber {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// One row of the traktamente dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraktamenteRow {
    #[serde(rename = "land eller område")]
    pub country: String,
    #[serde(rename = "normalbelopp")]
    pub amount: TextOrNumber,
    #[serde(rename = "år")]
    pub year: TextOrNumber,
    #[serde(rename = "landskod")]
    pub country_code: String,
}

impl TraktamenteRow {
    pub fn new(
        country: impl Into<String>,
        amount: impl Into<TextOrNumber>,
        year: impl Into<TextOrNumber>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            amount: amount.into(),
            year: year.into(),
            country_code: country_code.into(),
        }
    }
}

/// Raw payload returned by the rowstore endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamResponse {
    pub results: Vec<TraktamenteRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Filter fields a caller can send upstream. `None` fields are never forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub country: Option<String>,
    pub amount: Option<String>,
    pub year: Option<String>,
    pub country_code: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
