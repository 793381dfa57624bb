//! Artifact inspection: content checksums and embedded gitBOM identifiers.
//!
//! The search engine never looks inside binaries itself. It asks an
//! [`ArtifactInspector`] for a file's checksum, its coarse file kind and the
//! bom id embedded in it. [`ShellInspector`] implements this with the usual
//! command-line tools; tests substitute their own implementation.

mod shell;

pub use shell::{
    classify_description, parse_file_description, parse_readelf_bom_section, ShellInspector,
};

use crate::error::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Coarse file classification deciding how an embedded id is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `ar` archive (static library); id stored as a `.bom` member
    Archive,
    /// Java archive; id stored as a `.bom` entry
    JavaArchive,
    /// Anything else; id expected in an ELF `.bom` section
    Other,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive => write!(f, "archive"),
            Self::JavaArchive => write!(f, "java-archive"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// External collaborator contract for file-based searches.
pub trait ArtifactInspector {
    /// Git blob checksum of the file content.
    fn checksum(&self, path: &Path) -> Result<String>;

    /// Classify the file to pick an extraction strategy.
    fn classify(&self, path: &Path) -> FileKind;

    /// The bom id embedded in the file, if any.
    fn embedded_bom_id(&self, path: &Path, kind: FileKind) -> Option<String>;
}

/// Inspector that remembers successful checksums per path.
///
/// A file query hashes each artifact while indexing the object store and
/// again when resolving it for the search; wrapping the inspector makes
/// the second lookup free.
pub struct CachingInspector<'a> {
    inner: &'a dyn ArtifactInspector,
    checksums: RefCell<HashMap<PathBuf, String>>,
}

impl<'a> CachingInspector<'a> {
    pub fn new(inner: &'a dyn ArtifactInspector) -> Self {
        Self {
            inner,
            checksums: RefCell::new(HashMap::new()),
        }
    }
}

impl ArtifactInspector for CachingInspector<'_> {
    fn checksum(&self, path: &Path) -> Result<String> {
        if let Some(checksum) = self.checksums.borrow().get(path) {
            return Ok(checksum.clone());
        }
        let checksum = self.inner.checksum(path)?;
        self.checksums
            .borrow_mut()
            .insert(path.to_path_buf(), checksum.clone());
        Ok(checksum)
    }

    fn classify(&self, path: &Path) -> FileKind {
        self.inner.classify(path)
    }

    fn embedded_bom_id(&self, path: &Path, kind: FileKind) -> Option<String> {
        self.inner.embedded_bom_id(path, kind)
    }
}
