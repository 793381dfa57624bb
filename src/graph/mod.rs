//! The gitBOM hash graph: storage, adjacency construction, expansion and
//! CVE aggregation.
//!
//! Data flows leaf-first:
//!
//! ```text
//! ObjectStore ─► ChecksumDbBuilder ─► ChecksumDatabase
//!                                          │
//!             CveDatabase, MetadataDatabase ┤ (TreeSources)
//!                                          ▼
//!                                   HashTreeBuilder ─► TreeEntry ─► collect_cve_list
//! ```

mod aggregate;
mod builder;
mod expand;
mod store;
mod traits;

pub use aggregate::{collect_cve_list, summarize, CveSummary};
pub use builder::{ChecksumDbBuilder, DocumentMode};
pub use expand::{ExpansionCache, ExpansionStats, HashTreeBuilder};
pub use store::{document_lines, ObjectStore, OBJECTS_DIR};
pub use traits::{GraphDatabases, TreeSources};
