/*!
ZIP code handling.

`RegionCode` is the canonical 5-digit form used as the catalog key.
`parse_codes` turns free text typed by an operator into a clean code list.
*/

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{StructureError, StructureResult};

const CODE_LEN: usize = 5;

/// Canonical 5-digit postal code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Validate and wrap a code
    ///
    /// Surrounding whitespace is ignored; anything else that is not exactly
    /// five ASCII digits is rejected.
    pub fn new(code: impl AsRef<str>) -> StructureResult<Self> {
        let trimmed = code.as_ref().trim();
        if Self::is_valid(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(StructureError::InvalidCode(code.as_ref().to_string()))
        }
    }

    /// Build a code from a numeric feed value, zero-padding to five digits
    ///
    /// Feeds that store ZIPs as numbers lose leading zeros (`01001` arrives as
    /// `1001`).
    pub fn from_number(value: u64) -> StructureResult<Self> {
        if value > 99_999 {
            return Err(StructureError::InvalidCode(value.to_string()));
        }
        Ok(Self(format!("{:05}", value)))
    }

    /// Check the `^\d{5}$` shape without allocating
    pub fn is_valid(text: &str) -> bool {
        text.len() == CODE_LEN && text.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RegionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegionCode {
    type Error = StructureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RegionCode {
    type Error = StructureError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

/// Parse operator-entered text into a sorted, deduplicated code list
///
/// Tokens are split on commas and whitespace. From each token the first run of
/// five consecutive digits is taken (`"60452-1234"` yields `60452`); tokens
/// without one are dropped.
pub fn parse_codes(text: &str) -> Vec<RegionCode> {
    let unique: BTreeSet<RegionCode> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(first_digit_run)
        .collect();
    unique.into_iter().collect()
}

fn first_digit_run(token: &str) -> Option<RegionCode> {
    let bytes = token.as_bytes();
    if bytes.len() < CODE_LEN {
        return None;
    }
    (0..=bytes.len() - CODE_LEN)
        .find(|&start| bytes[start..start + CODE_LEN].iter().all(u8::is_ascii_digit))
        .map(|start| RegionCode(token[start..start + CODE_LEN].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert!(RegionCode::new("60452").is_ok());
        assert_eq!(RegionCode::new(" 60452 ").unwrap().as_str(), "60452");
        assert!(RegionCode::new("6045").is_err());
        assert!(RegionCode::new("604521").is_err());
        assert!(RegionCode::new("6045a").is_err());
    }

    #[test]
    fn test_from_number_pads_leading_zeros() {
        assert_eq!(RegionCode::from_number(1001).unwrap().as_str(), "01001");
        assert_eq!(RegionCode::from_number(60452).unwrap().as_str(), "60452");
        assert!(RegionCode::from_number(100_000).is_err());
    }

    #[test]
    fn test_parse_codes_sorts_and_dedups() {
        let codes = parse_codes("60453, 60452 60453\n60462");
        let as_str: Vec<&str> = codes.iter().map(RegionCode::as_str).collect();
        assert_eq!(as_str, vec!["60452", "60453", "60462"]);
    }

    #[test]
    fn test_parse_codes_extracts_first_digit_run() {
        let codes = parse_codes("zip:46307-1120,abc,123,x47905y");
        let as_str: Vec<&str> = codes.iter().map(RegionCode::as_str).collect();
        assert_eq!(as_str, vec!["46307", "47905"]);
    }

    #[test]
    fn test_parse_codes_empty() {
        assert!(parse_codes("").is_empty());
        assert!(parse_codes(" , ,, ").is_empty());
    }

    #[test]
    fn test_serde_rejects_bad_code() {
        let ok: RegionCode = serde_json::from_str("\"60452\"").unwrap();
        assert_eq!(ok.as_str(), "60452");
        assert!(serde_json::from_str::<RegionCode>("\"6045\"").is_err());
    }
}
