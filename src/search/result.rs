//! Search result types.

use crate::graph::CveSummary;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Marker for a queried checksum absent from the adjacency database.
pub const NOT_FOUND_IN_CHECKSUM_DB: &str = "NOT_FOUND_IN_CHECKSUM_DB";
/// Marker for a queried file that does not exist.
pub const FILE_NOT_EXIST: &str = "FILE_NOT_EXIST";
/// Marker for an existing file whose checksum could not be computed.
pub const CHECKSUM_UNAVAILABLE: &str = "CHECKSUM_UNAVAILABLE";

/// Outcome of a CVE lookup for one queried item.
///
/// Serializes as the CVE summary object, or as a marker string for items
/// that could not be searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CveLookup {
    Found(CveSummary),
    NotInChecksumDb,
    FileNotExist,
    ChecksumUnavailable,
}

impl CveLookup {
    pub const fn summary(&self) -> Option<&CveSummary> {
        match self {
            Self::Found(summary) => Some(summary),
            _ => None,
        }
    }

    /// Marker string for items without a summary.
    pub const fn marker(&self) -> Option<&'static str> {
        match self {
            Self::Found(_) => None,
            Self::NotInChecksumDb => Some(NOT_FOUND_IN_CHECKSUM_DB),
            Self::FileNotExist => Some(FILE_NOT_EXIST),
            Self::ChecksumUnavailable => Some(CHECKSUM_UNAVAILABLE),
        }
    }
}

impl Serialize for CveLookup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Found(summary) => summary.serialize(serializer),
            Self::NotInChecksumDb => serializer.serialize_str(NOT_FOUND_IN_CHECKSUM_DB),
            Self::FileNotExist => serializer.serialize_str(FILE_NOT_EXIST),
            Self::ChecksumUnavailable => serializer.serialize_str(CHECKSUM_UNAVAILABLE),
        }
    }
}

/// The result of one search run, keyed by the queried item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SearchResult {
    /// Checksum, bom id or file → CVE lookup
    Cves(BTreeMap<String, CveLookup>),
    /// CVE id → vulnerable blob checksums
    Checksums(BTreeMap<String, Vec<String>>),
}

impl SearchResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Cves(map) => map.len(),
            Self::Checksums(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any queried item resolved to at least one vulnerability.
    pub fn has_vulnerabilities(&self) -> bool {
        match self {
            Self::Cves(map) => map
                .values()
                .filter_map(CveLookup::summary)
                .any(CveSummary::has_cves),
            Self::Checksums(map) => map.values().any(|blobs| !blobs.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_serialization() {
        let found = CveLookup::Found(CveSummary {
            cve_list: ["CVE-2021-1".to_string()].into(),
            ..CveSummary::default()
        });
        let result = SearchResult::Cves(BTreeMap::from([
            ("a".to_string(), found),
            ("b".to_string(), CveLookup::NotInChecksumDb),
            ("c".to_string(), CveLookup::FileNotExist),
        ]));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "a": {"CVElist": ["CVE-2021-1"], "FixedCVElist": []},
                "b": "NOT_FOUND_IN_CHECKSUM_DB",
                "c": "FILE_NOT_EXIST"
            })
        );
        assert!(result.has_vulnerabilities());
    }

    #[test]
    fn test_reverse_result_vulnerability_check() {
        let empty = SearchResult::Checksums(BTreeMap::from([("CVE-1".to_string(), Vec::new())]));
        assert!(!empty.has_vulnerabilities());
        assert!(!empty.is_empty());
        assert!(SearchResult::Cves(BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_markers() {
        assert_eq!(CveLookup::ChecksumUnavailable.marker(), Some(CHECKSUM_UNAVAILABLE));
        assert_eq!(CveLookup::Found(CveSummary::default()).marker(), None);
    }
}
