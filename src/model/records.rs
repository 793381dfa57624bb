//! Database records and the in-memory databases built from them.
//!
//! All databases are JSON objects keyed by checksum. Unknown fields in a
//! record are ignored so that databases produced by newer tooling still load.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ============================================================================
// CVE lists
// ============================================================================

/// Which of the two CVE lists a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CveListKind {
    /// CVEs the artifact is vulnerable to (`CVElist`)
    Vulnerable,
    /// CVEs the artifact contains fixes for (`FixedCVElist`)
    Fixed,
}

impl CveListKind {
    /// Both kinds, in output order.
    pub const ALL: [Self; 2] = [Self::Vulnerable, Self::Fixed];

    /// JSON field name used by the CVE database and the search result.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Vulnerable => "CVElist",
            Self::Fixed => "FixedCVElist",
        }
    }
}

impl fmt::Display for CveListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// ============================================================================
// Records
// ============================================================================

/// Vulnerability facts recorded for one blob checksum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveRecord {
    #[serde(rename = "CVElist", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub cve_list: BTreeSet<String>,
    #[serde(rename = "FixedCVElist", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub fixed_cve_list: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl CveRecord {
    /// Build a record carrying only vulnerable CVEs.
    pub fn vulnerable<I, S>(cves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cve_list: cves.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The requested CVE list.
    pub const fn list(&self, kind: CveListKind) -> &BTreeSet<String> {
        match kind {
            CveListKind::Vulnerable => &self.cve_list,
            CveListKind::Fixed => &self.fixed_cve_list,
        }
    }
}

/// Build metadata recorded for one checksum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_cmd: Option<String>,
}

/// One node of the adjacency database.
///
/// `hash_tree` holds the literal child reference lines. Raw checksum
/// databases may also carry build metadata, which is copied onto the
/// expanded node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_tree: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_cmd: Option<String>,
}

impl ChecksumNode {
    /// A node with the given child references and no metadata.
    pub fn with_children(children: Vec<String>) -> Self {
        Self {
            hash_tree: Some(children),
            ..Self::default()
        }
    }

    /// Child reference lines (empty for leaves).
    pub fn children(&self) -> &[String] {
        self.hash_tree.as_deref().unwrap_or(&[])
    }

    /// A node without children is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

// ============================================================================
// Databases
// ============================================================================

/// Blob checksum → CVE facts. Insertion order follows the source file.
pub type CveDatabase = IndexMap<String, CveRecord>;

/// Checksum → build metadata.
pub type MetadataDatabase = HashMap<String, MetadataRecord>;

/// Node id → children. Insertion order follows discovery order.
pub type ChecksumDatabase = IndexMap<String, ChecksumNode>;

/// Mapping from blob id to the bom id of the document describing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobBomTable(HashMap<String, String>);

impl BlobBomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `blob → bom`, replacing any earlier association.
    pub fn insert(&mut self, blob: impl Into<String>, bom: impl Into<String>) {
        self.0.insert(blob.into(), bom.into());
    }

    pub fn get(&self, blob: &str) -> Option<&str> {
        self.0.get(blob).map(String::as_str)
    }

    pub fn contains(&self, blob: &str) -> bool {
        self.0.contains_key(blob)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BlobBomTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(blob, bom)| (blob.into(), bom.into()))
                .collect(),
        )
    }
}
