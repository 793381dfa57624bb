//! On-disk gitBOM object store.
//!
//! Documents live at `objects/<first 2 hex chars>/<remaining hex chars>`,
//! one file per bom id. Each non-empty line is a node reference.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the object directory inside a gitBOM repository.
pub const OBJECTS_DIR: &str = "objects";

/// Read access to a two-level fan-out document store.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Open a store rooted at an `objects` directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store of a gitBOM repository directory.
    pub fn in_bom_dir(bom_dir: &Path) -> Self {
        Self::new(bom_dir.join(OBJECTS_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Location of the document for `id`.
    ///
    /// Returns `None` for ids that are not plain hex, so untrusted document
    /// content can never address files outside the store.
    pub fn document_path(&self, id: &str) -> Option<PathBuf> {
        if id.len() < 3 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(self.root.join(&id[..2]).join(&id[2..]))
    }

    /// Read the reference lines of a document.
    ///
    /// A missing document is not an error: the caller treats the node as a
    /// leaf. Unreadable documents are logged and treated the same way.
    pub fn read_document(&self, id: &str) -> Option<Vec<String>> {
        let path = self.document_path(id)?;
        match fs::read_to_string(&path) {
            Ok(content) => Some(document_lines(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No gitBOM document for {id}");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read gitBOM document {}: {e}", path.display());
                None
            }
        }
    }

    /// Enumerate the bom ids of every document in the store.
    ///
    /// Entries that do not follow the fan-out layout are skipped. The result
    /// is sorted.
    pub fn documents(&self) -> io::Result<Vec<String>> {
        let mut documents = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let prefix = entry.file_name().to_string_lossy().into_owned();
            if prefix.len() != 2 || !entry.file_type()?.is_dir() {
                continue;
            }
            for doc in fs::read_dir(entry.path())? {
                let doc = doc?;
                if !doc.file_type()?.is_file() {
                    continue;
                }
                documents.push(format!("{prefix}{}", doc.file_name().to_string_lossy()));
            }
        }
        documents.sort();
        Ok(documents)
    }
}

/// Split document text into trimmed, non-empty reference lines.
pub fn document_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ID: &str = "0123456789abcdef0123456789abcdef01234567";

    fn write_doc(store: &ObjectStore, id: &str, body: &str) {
        let path = store.document_path(id).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_document_path_layout() {
        let store = ObjectStore::new("/repo/objects");
        assert_eq!(
            store.document_path(ID),
            Some(PathBuf::from("/repo/objects/01").join(&ID[2..]))
        );
    }

    #[test]
    fn test_document_path_rejects_non_hex() {
        let store = ObjectStore::new("/repo/objects");
        assert_eq!(store.document_path("../../etc/passwd"), None);
        assert_eq!(store.document_path("ab"), None);
    }

    #[test]
    fn test_read_document_lines() {
        let tmp = TempDir::new().unwrap();
        let store = ObjectStore::in_bom_dir(tmp.path());
        write_doc(&store, ID, "blob aaaa\n\n  blob bbbb bom cccc  \n");
        assert_eq!(
            store.read_document(ID),
            Some(vec!["blob aaaa".to_string(), "blob bbbb bom cccc".to_string()])
        );
    }

    #[test]
    fn test_missing_document_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = ObjectStore::in_bom_dir(tmp.path());
        assert!(!store.exists());
        assert_eq!(store.read_document(ID), None);
    }

    #[test]
    fn test_documents_skips_foreign_entries() {
        let tmp = TempDir::new().unwrap();
        let store = ObjectStore::in_bom_dir(tmp.path());
        write_doc(&store, ID, "blob aaaa\n");
        write_doc(&store, "ff00", "blob bbbb\n");
        fs::create_dir_all(store.root().join("info")).unwrap();
        fs::write(store.root().join("README"), "not a document").unwrap();

        assert_eq!(
            store.documents().unwrap(),
            vec![ID.to_string(), "ff00".to_string()]
        );
    }
}
