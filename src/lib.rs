//! **Correlate build artifacts with known vulnerabilities through a gitBOM hash graph.**
//!
//! A gitBOM repository records, for every build output, a document listing the
//! checksums of the inputs it was built from. `gitbom-cve` walks that graph to
//! answer two questions:
//!
//! - Which CVEs affect (or are fixed in) a given file, checksum or gitBOM
//!   document?
//! - Which blob checksums are vulnerable to a given CVE?
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: node references (`blob X bom Y` lines), database records
//!   and the expanded tree types.
//! - **[`graph`]**: the object store, adjacency database construction
//!   ([`ChecksumDbBuilder`]), memoizing cycle-safe expansion
//!   ([`HashTreeBuilder`]) and CVE aggregation.
//! - **[`inspect`]**: the [`ArtifactInspector`] seam for checksums and
//!   embedded gitBOM identifiers, with a shell-tool implementation.
//! - **[`search`]**: the four query operations and their result types.
//! - **[`pipeline`]**: database loading and JSON output.
//!
//! ## Getting Started
//!
//! ```no_run
//! use gitbom_cve::{summarize, CveDatabase, GraphDatabases, HashTreeBuilder};
//! use gitbom_cve::pipeline::load_json_db;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cves: CveDatabase = load_json_db(Path::new("cve_db.json"))?;
//!     let checksums = load_json_db(Path::new("raw_checksums.json"))?;
//!     let dbs = GraphDatabases::new(checksums, cves);
//!
//!     let mut builder = HashTreeBuilder::new(&dbs);
//!     let tree = builder.expand("4b2a3c1d5e6f708192a3b4c5d6e7f8091a2b3c4d");
//!     println!("{:?}", summarize(&tree).cve_list);
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Doc completeness: # Errors / # Panics sections are aspirational
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod inspect;
pub mod model;
pub mod pipeline;
pub mod search;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, SearchConfig, SearchQuery};
pub use config::{ConfigError, Validatable};
pub use error::{CveSearchError, ErrorContext, OptionContext, Result};
pub use graph::{
    collect_cve_list, summarize, ChecksumDbBuilder, CveSummary, DocumentMode, GraphDatabases,
    HashTreeBuilder, ObjectStore, TreeSources,
};
pub use inspect::{ArtifactInspector, FileKind, ShellInspector};
pub use model::{
    BlobBomTable, ChecksumDatabase, ChecksumNode, CveDatabase, CveListKind, CveRecord,
    ExpandedNode, MetadataDatabase, MetadataRecord, NodeRef, TreeEntry,
};
pub use search::{checksums_for_cves, CveLookup, CveSearch, SearchResult};
