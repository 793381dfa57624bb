//! Read-only lookup seam between the expansion engine and its databases.

use crate::model::{
    ChecksumDatabase, ChecksumNode, CveDatabase, CveRecord, MetadataDatabase, MetadataRecord,
};

/// Lookups the hash tree builder performs while expanding.
///
/// Implementations must be side-effect free from the caller's point of view;
/// the builder treats every source as an immutable snapshot for the run.
pub trait TreeSources {
    /// Adjacency record for a node id.
    fn checksum_node(&self, node_id: &str) -> Option<&ChecksumNode>;

    /// Vulnerability record for a blob checksum.
    fn cve_record(&self, checksum: &str) -> Option<&CveRecord>;

    /// Build metadata for a checksum.
    fn metadata_record(&self, checksum: &str) -> Option<&MetadataRecord>;
}

/// The databases loaded for one run.
#[derive(Debug, Clone, Default)]
pub struct GraphDatabases {
    /// Adjacency database (node id → children)
    pub checksums: ChecksumDatabase,
    /// CVE database (blob id → CVE lists)
    pub cves: CveDatabase,
    /// Optional build metadata database
    pub metadata: Option<MetadataDatabase>,
}

impl GraphDatabases {
    pub fn new(checksums: ChecksumDatabase, cves: CveDatabase) -> Self {
        Self {
            checksums,
            cves,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: MetadataDatabase) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl TreeSources for GraphDatabases {
    fn checksum_node(&self, node_id: &str) -> Option<&ChecksumNode> {
        self.checksums.get(node_id)
    }

    fn cve_record(&self, checksum: &str) -> Option<&CveRecord> {
        self.cves.get(checksum)
    }

    fn metadata_record(&self, checksum: &str) -> Option<&MetadataRecord> {
        self.metadata.as_ref()?.get(checksum)
    }
}
