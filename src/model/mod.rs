//! Data model for gitBOM hash graphs and vulnerability databases.
//!
//! - [`reference`]: the textual node references found in gitBOM documents
//! - [`records`]: CVE, metadata and adjacency records plus the databases
//!   holding them
//! - [`tree`]: expanded, metadata-enriched hash trees

pub mod reference;
mod records;
mod tree;

pub use reference::NodeRef;
pub use records::*;
pub use tree::*;
