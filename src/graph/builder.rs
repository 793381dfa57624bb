//! Adjacency database construction from a gitBOM object store.
//!
//! Two strategies are supported:
//!
//! - [`ChecksumDbBuilder::scan_all`] indexes every document in the store.
//! - [`ChecksumDbBuilder::scan_files`] starts from the bom ids embedded in a
//!   list of artifacts and reads only the documents reachable from them.
//!
//! Both learn a blob → bom side table from composite lines while they read.

use super::store::ObjectStore;
use crate::inspect::ArtifactInspector;
use crate::model::{BlobBomTable, ChecksumDatabase, ChecksumNode, NodeRef};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How document lines become adjacency entries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentMode {
    /// Keep each full reference line (`blob X bom Y`); nodes keyed by bom id
    #[default]
    ChecksumLine,
    /// Keep only the bom id (or blob id) of each line
    BomId,
}

impl fmt::Display for DocumentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChecksumLine => write!(f, "checksum-line"),
            Self::BomId => write!(f, "bom-id"),
        }
    }
}

/// Builds a [`ChecksumDatabase`] from an [`ObjectStore`].
///
/// The builder owns the per-run blob → bom side table, so separate runs (and
/// tests) never share learned mappings.
#[derive(Debug, Clone)]
pub struct ChecksumDbBuilder {
    store: ObjectStore,
    mode: DocumentMode,
    blob_boms: BlobBomTable,
    recorded: BlobBomTable,
}

impl ChecksumDbBuilder {
    pub fn new(store: ObjectStore, mode: DocumentMode) -> Self {
        Self {
            store,
            mode,
            blob_boms: BlobBomTable::new(),
            recorded: BlobBomTable::new(),
        }
    }

    /// Use a persisted blob → bom mapping for artifacts whose embedded id
    /// cannot be extracted.
    #[must_use]
    pub fn with_recorded_mappings(mut self, recorded: BlobBomTable) -> Self {
        self.recorded = recorded;
        self
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub const fn mode(&self) -> DocumentMode {
        self.mode
    }

    /// Blob → bom associations learned from the documents read so far.
    pub fn blob_bom_table(&self) -> &BlobBomTable {
        &self.blob_boms
    }

    // ------------------------------------------------------------------------
    // Full-store scan
    // ------------------------------------------------------------------------

    /// Index every document in the store, keyed by its bom id.
    ///
    /// A missing store yields an empty database.
    pub fn scan_all(&mut self) -> ChecksumDatabase {
        let mut db = ChecksumDatabase::new();
        if !self.store.exists() {
            tracing::warn!(
                "gitBOM objects directory does not exist: {}",
                self.store.root().display()
            );
            return db;
        }

        let ids = match self.store.documents() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(
                    "Failed to list gitBOM objects in {}: {e}",
                    self.store.root().display()
                );
                return db;
            }
        };

        for id in ids {
            let Some(lines) = self.store.read_document(&id) else {
                continue;
            };
            let children = match self.mode {
                DocumentMode::ChecksumLine => lines,
                DocumentMode::BomId => self.bom_id_children(&lines),
            };
            db.insert(id, ChecksumNode::with_children(children));
        }

        tracing::info!("Indexed {} gitBOM documents", db.len());
        db
    }

    // ------------------------------------------------------------------------
    // Targeted scan
    // ------------------------------------------------------------------------

    /// Index only the documents reachable from the given artifacts.
    ///
    /// Artifacts whose checksum or bom id cannot be resolved are skipped with
    /// a warning.
    pub fn scan_files(
        &mut self,
        files: &[PathBuf],
        inspector: &dyn ArtifactInspector,
    ) -> ChecksumDatabase {
        let mut db = ChecksumDatabase::new();
        if !self.store.exists() {
            tracing::warn!(
                "gitBOM objects directory does not exist: {}",
                self.store.root().display()
            );
            return db;
        }

        for file in files {
            if !file.exists() {
                tracing::debug!("Skipping missing file {}", file.display());
                continue;
            }
            let Some((checksum, bom_id)) = self.resolve_artifact(file, inspector) else {
                continue;
            };
            tracing::debug!(
                "blob_id: {checksum} bom_id: {bom_id} file: {}",
                file.display()
            );
            self.add_artifact(&mut db, &checksum, &bom_id);
        }

        tracing::info!(
            "Indexed {} hash tree nodes for {} files",
            db.len(),
            files.len()
        );
        db
    }

    /// Register one artifact and every document reachable from its bom id.
    pub fn add_artifact(&mut self, db: &mut ChecksumDatabase, checksum: &str, bom_id: &str) {
        match self.mode {
            DocumentMode::ChecksumLine => {
                db.insert(
                    checksum.to_string(),
                    ChecksumNode::with_children(vec![bom_id.to_string()]),
                );
                self.follow_checksum_lines(db, bom_id);
            }
            DocumentMode::BomId => self.follow_blob_ids(db, checksum, bom_id),
        }
    }

    fn resolve_artifact(
        &self,
        file: &Path,
        inspector: &dyn ArtifactInspector,
    ) -> Option<(String, String)> {
        let checksum = match inspector.checksum(file) {
            Ok(checksum) => checksum,
            Err(e) => {
                tracing::warn!("Cannot compute checksum of {}: {e}", file.display());
                return None;
            }
        };

        let kind = inspector.classify(file);
        if let Some(bom_id) = inspector.embedded_bom_id(file, kind) {
            return Some((checksum, bom_id));
        }

        tracing::warn!("No embedded .bom section in file: {}", file.display());
        match self.recorded.get(&checksum) {
            Some(bom_id) => {
                tracing::warn!(
                    "From recorded gitBOM mappings, found bom_id {bom_id} for file: {}",
                    file.display()
                );
                Some((checksum, bom_id.to_string()))
            }
            None => {
                tracing::warn!("No recorded bom_id mapping for file: {}", file.display());
                None
            }
        }
    }

    /// Checksum-line mode: key documents by bom id, keep full lines and
    /// descend into every composite line.
    fn follow_checksum_lines(&mut self, db: &mut ChecksumDatabase, bom_id: &str) {
        let mut pending = vec![bom_id.to_string()];
        while let Some(bom_id) = pending.pop() {
            if db.contains_key(&bom_id) {
                continue;
            }
            let Some(lines) = self.store.read_document(&bom_id) else {
                continue;
            };
            if lines.is_empty() {
                continue;
            }
            for line in lines.iter().rev() {
                let node = NodeRef::parse(line);
                if let Some(child_bom) = node.bom_id() {
                    self.blob_boms.insert(node.blob_id(), child_bom);
                    pending.push(child_bom.to_string());
                }
            }
            db.insert(bom_id, ChecksumNode::with_children(lines));
        }
    }

    /// Bom-id mode: key documents by the artifact's blob id, keep blob ids as
    /// children and descend into children with a known bom id.
    fn follow_blob_ids(&mut self, db: &mut ChecksumDatabase, checksum: &str, bom_id: &str) {
        let mut pending = vec![(checksum.to_string(), bom_id.to_string())];
        while let Some((checksum, bom_id)) = pending.pop() {
            if db.contains_key(&checksum) {
                continue;
            }
            let Some(lines) = self.store.read_document(&bom_id) else {
                continue;
            };
            let children = self.blob_id_children(&lines);
            if children.is_empty() {
                continue;
            }
            for child in children.iter().rev() {
                if let Some(child_bom) = self.blob_boms.get(child) {
                    pending.push((child.clone(), child_bom.to_string()));
                }
            }
            db.insert(checksum, ChecksumNode::with_children(children));
        }
    }

    /// Node ids of the `blob X` and `blob X bom Y` lines, learning composite
    /// lines into the side table.
    fn bom_id_children(&mut self, lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .filter(|line| {
                matches!(
                    tokens(line).as_slice(),
                    ["blob", _] | ["blob", _, "bom", _]
                )
            })
            .map(|line| NodeRef::parse(line))
            .filter(|node| !node.is_empty())
            .map(|node| {
                self.learn(node);
                node.node_id().to_string()
            })
            .collect()
    }

    /// Blob ids of each line, learning composite lines into the side table.
    fn blob_id_children(&mut self, lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .filter(|line| matches!(tokens(line).as_slice(), ["blob", _, ..]))
            .map(|line| NodeRef::parse(line))
            .filter(|node| !node.is_empty())
            .map(|node| {
                self.learn(node);
                node.blob_id().to_string()
            })
            .collect()
    }

    fn learn(&mut self, node: NodeRef<'_>) {
        if let Some(bom) = node.bom_id() {
            self.blob_boms.insert(node.blob_id(), bom);
        }
    }
}

/// Whitespace-separated tokens of a document line.
fn tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
