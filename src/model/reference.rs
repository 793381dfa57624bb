//! Node references as they appear in gitBOM documents.
//!
//! A document line takes one of three shapes:
//!
//! - `<checksum>` (bare)
//! - `blob <checksum>`
//! - `blob <checksum> bom <checksum>` (composite)
//!
//! The *node id* used against the adjacency database is the bom id when the
//! line carries one, otherwise the blob id. CVE databases are indexed by blob
//! id, so both halves stay reachable through [`NodeRef`].

use std::fmt;

const BLOB_TOKEN: &str = "blob";
const BOM_TOKEN: &str = "bom";

/// A parsed, borrowed view of a node reference line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef<'a> {
    blob: &'a str,
    bom: Option<&'a str>,
}

impl<'a> NodeRef<'a> {
    /// Parse a reference line.
    ///
    /// Malformed composite lines (a lone `blob` token) yield an empty blob id
    /// rather than an error.
    pub fn parse(line: &'a str) -> Self {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some(BLOB_TOKEN) => {
                let blob = tokens.next().unwrap_or("");
                let bom = match (tokens.next(), tokens.next()) {
                    (Some(BOM_TOKEN), Some(bom)) => Some(bom),
                    _ => None,
                };
                Self { blob, bom }
            }
            _ => Self {
                blob: line.trim(),
                bom: None,
            },
        }
    }

    /// Content checksum of the artifact.
    pub const fn blob_id(&self) -> &'a str {
        self.blob
    }

    /// Checksum of the associated gitBOM document, if the line names one.
    pub const fn bom_id(&self) -> Option<&'a str> {
        self.bom
    }

    /// Key used against the adjacency database.
    pub fn node_id(&self) -> &'a str {
        self.bom.unwrap_or(self.blob)
    }

    /// Whether the reference carries both a blob id and a bom id.
    pub const fn is_composite(&self) -> bool {
        self.bom.is_some()
    }

    /// Whether parsing produced nothing usable.
    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bom {
            Some(bom) => write!(f, "{BLOB_TOKEN} {} {BOM_TOKEN} {bom}", self.blob),
            None => f.write_str(self.blob),
        }
    }
}

/// Split a reference line into `(blob_id, bom_id)`, with an empty bom id for
/// non-composite lines.
pub fn parse_line(line: &str) -> (&str, &str) {
    let node = NodeRef::parse(line);
    (node.blob_id(), node.bom_id().unwrap_or(""))
}

/// Adjacency-database key for a reference line.
pub fn node_id(line: &str) -> &str {
    NodeRef::parse(line).node_id()
}

/// Format a composite `blob <blob> bom <bom>` line.
pub fn composite_line(blob: &str, bom: &str) -> String {
    NodeRef {
        blob,
        bom: Some(bom),
    }
    .to_string()
}

/// Check whether a string looks like a git object id (SHA-1 or SHA-256, hex).
pub fn is_checksum(value: &str) -> bool {
    matches!(value.len(), 40 | 64) && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOM: &str = "cccccccccccccccccccccccccccccccccccccccc";

    #[test]
    fn test_bare_checksum() {
        let line = format!("  {BLOB}\n");
        let node = NodeRef::parse(&line);
        assert_eq!(node.blob_id(), BLOB);
        assert_eq!(node.bom_id(), None);
        assert_eq!(node.node_id(), BLOB);
        assert!(!node.is_composite());
    }

    #[test]
    fn test_blob_only_line() {
        let line = format!("blob {BLOB}");
        assert_eq!(parse_line(&line), (BLOB, ""));
        assert_eq!(node_id(&line), BLOB);
    }

    #[test]
    fn test_composite_line() {
        let line = format!("blob {BLOB} bom {BOM}");
        let node = NodeRef::parse(&line);
        assert_eq!(node.blob_id(), BLOB);
        assert_eq!(node.bom_id(), Some(BOM));
        assert_eq!(node.node_id(), BOM);
        assert!(node.is_composite());
        assert_eq!(node.to_string(), line);
    }

    #[test]
    fn test_composite_line_formatting() {
        assert_eq!(composite_line(BLOB, BOM), format!("blob {BLOB} bom {BOM}"));
    }

    #[test]
    fn test_malformed_blob_line_is_empty() {
        let node = NodeRef::parse("blob");
        assert!(node.is_empty());
        assert_eq!(node.node_id(), "");
    }

    #[test]
    fn test_dangling_bom_token_is_ignored() {
        let line = format!("blob {BLOB} bom");
        assert_eq!(parse_line(&line), (BLOB, ""));
    }

    #[test]
    fn test_is_checksum() {
        assert!(is_checksum(BLOB));
        assert!(is_checksum(&"0123456789abcdef".repeat(4)));
        assert!(!is_checksum("abc"));
        assert!(!is_checksum("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"));
    }
}
