//! The four search operations.
//!
//! [`CveSearch`] answers CVE queries for checksums, bom ids and files by
//! expanding hash trees; [`checksums_for_cves`] answers the reverse query
//! directly from the CVE database. Per-item problems become [`CveLookup`]
//! markers, so a batch always runs to completion.

mod result;

pub use result::{
    CveLookup, SearchResult, CHECKSUM_UNAVAILABLE, FILE_NOT_EXIST, NOT_FOUND_IN_CHECKSUM_DB,
};

use crate::graph::{summarize, ExpansionCache, ExpansionStats, HashTreeBuilder, TreeSources};
use crate::inspect::ArtifactInspector;
use crate::model::{CveDatabase, TreeEntry};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Query façade over one run's databases.
///
/// The expansion memo persists across calls, so repeated or overlapping
/// queries in the same run reuse earlier work.
pub struct CveSearch<'a, S: TreeSources + ?Sized> {
    builder: HashTreeBuilder<'a, S>,
    trees: IndexMap<String, TreeEntry>,
}

impl<'a, S: TreeSources + ?Sized> CveSearch<'a, S> {
    pub fn new(sources: &'a S) -> Self {
        Self {
            builder: HashTreeBuilder::new(sources),
            trees: IndexMap::new(),
        }
    }

    /// CVEs for each checksum, aggregated over its hash tree.
    pub fn cves_for_checksums<T: AsRef<str>>(
        &mut self,
        checksums: &[T],
    ) -> BTreeMap<String, CveLookup> {
        let trees = self.builder.expand_roots(checksums.iter().map(AsRef::<str>::as_ref));
        let results = checksums
            .iter()
            .map(AsRef::<str>::as_ref)
            .map(|checksum| {
                let lookup = trees
                    .get(checksum)
                    .map_or(CveLookup::NotInChecksumDb, |tree| {
                        CveLookup::Found(summarize(tree))
                    });
                (checksum.to_string(), lookup)
            })
            .collect();
        self.trees.extend(trees);
        results
    }

    /// CVEs for gitBOM document ids.
    ///
    /// Bom ids share the checksum namespace of the adjacency database.
    pub fn cves_for_bom_ids<T: AsRef<str>>(&mut self, bom_ids: &[T]) -> BTreeMap<String, CveLookup> {
        self.cves_for_checksums(bom_ids)
    }

    /// CVEs for files, keyed by the path as given.
    pub fn cves_for_files(
        &mut self,
        files: &[PathBuf],
        inspector: &dyn ArtifactInspector,
    ) -> BTreeMap<String, CveLookup> {
        let mut results = BTreeMap::new();
        let mut resolved = Vec::with_capacity(files.len());
        for file in files {
            let key = file.display().to_string();
            if !file.exists() {
                tracing::warn!("File does not exist: {key}");
                results.insert(key, CveLookup::FileNotExist);
                continue;
            }
            match inspector.checksum(file) {
                Ok(checksum) => resolved.push((key, checksum)),
                Err(e) => {
                    tracing::warn!("Cannot compute checksum of {key}: {e}");
                    results.insert(key, CveLookup::ChecksumUnavailable);
                }
            }
        }

        let checksums: Vec<&str> = resolved.iter().map(|(_, checksum)| checksum.as_str()).collect();
        let by_checksum = self.cves_for_checksums(&checksums);
        for (key, checksum) in resolved {
            if let Some(lookup) = by_checksum.get(&checksum) {
                results.insert(key, lookup.clone());
            }
        }
        results
    }

    /// Expanded trees of every root searched so far.
    pub fn trees(&self) -> &IndexMap<String, TreeEntry> {
        &self.trees
    }

    pub fn cache(&self) -> &ExpansionCache {
        self.builder.cache()
    }

    pub const fn stats(&self) -> ExpansionStats {
        self.builder.stats()
    }
}

/// Blob checksums whose `CVElist` contains each CVE, in database order.
pub fn checksums_for_cves<T: AsRef<str>>(
    cves: &[T],
    cve_db: &CveDatabase,
) -> BTreeMap<String, Vec<String>> {
    cves.iter()
        .map(AsRef::<str>::as_ref)
        .map(|cve| {
            let blobs = cve_db
                .iter()
                .filter(|(_, record)| record.cve_list.contains(cve))
                .map(|(blob, _)| blob.clone())
                .collect();
            (cve.to_string(), blobs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphDatabases;
    use crate::model::{ChecksumDatabase, ChecksumNode, CveRecord};

    #[test]
    fn test_reverse_query_linear_scan() {
        let mut cve_db = CveDatabase::new();
        cve_db.insert("b1".to_string(), CveRecord::vulnerable(["CVE-2022-9999"]));
        cve_db.insert("b2".to_string(), CveRecord::vulnerable(["CVE-2022-0001"]));
        cve_db.insert(
            "b3".to_string(),
            CveRecord::vulnerable(["CVE-2022-9999", "CVE-2022-0001"]),
        );

        let result = checksums_for_cves(&["CVE-2022-9999", "CVE-2000-0000"], &cve_db);
        assert_eq!(result["CVE-2022-9999"], ["b1", "b3"]);
        assert!(result["CVE-2000-0000"].is_empty());
    }

    #[test]
    fn test_missing_checksum_marker() {
        let root = "b".repeat(40);
        let leaf = "a".repeat(40);
        let mut checksums = ChecksumDatabase::new();
        checksums.insert(root.clone(), ChecksumNode::with_children(vec![leaf.clone()]));
        let mut cves = CveDatabase::new();
        cves.insert(leaf.clone(), CveRecord::vulnerable(["CVE-2021-1"]));
        let dbs = GraphDatabases::new(checksums, cves);

        let mut search = CveSearch::new(&dbs);
        let results = search.cves_for_checksums(&[root.as_str(), leaf.as_str()]);
        assert_eq!(results[&leaf], CveLookup::NotInChecksumDb);
        let summary = results[&root].summary().unwrap();
        assert!(summary.cve_list.contains("CVE-2021-1"));
        assert_eq!(search.trees().len(), 1);
    }
}
