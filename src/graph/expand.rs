//! Hash tree expansion.
//!
//! [`HashTreeBuilder`] turns a node reference into an [`ExpandedNode`] tree,
//! attaching CVE lists and build metadata from the [`TreeSources`] as it
//! goes. It is the per-run traversal context: the memo cache and the ancestor
//! stack live here, never in global state.
//!
//! # Cycles
//!
//! A node id already on the active expansion path is replaced by
//! [`TreeEntry::CycleDetected`]. The same node reached through two sibling
//! branches is not a cycle and is expanded (or served from the cache) both
//! times.

use super::traits::TreeSources;
use crate::model::reference::{self, NodeRef};
use crate::model::{Children, CveListKind, ExpandedNode, TreeEntry};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::rc::Rc;

/// Literal reference line → finished subtree.
///
/// Keyed by the literal line, not the node id: `X` and `blob X bom Y` may
/// attach different metadata.
pub type ExpansionCache = IndexMap<String, Rc<ExpandedNode>>;

/// Counters describing the work done by one builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionStats {
    /// Nodes built from the sources (cache misses)
    pub nodes_built: usize,
    /// References answered from the memo cache
    pub cache_hits: usize,
    /// Branches cut by the ancestor check
    pub cycles_detected: usize,
}

/// Memoizing, cycle-safe hash tree expansion over a set of [`TreeSources`].
pub struct HashTreeBuilder<'a, S: TreeSources + ?Sized> {
    sources: &'a S,
    cache: ExpansionCache,
    ancestors: Vec<String>,
    active: HashSet<String>,
    stats: ExpansionStats,
}

impl<'a, S: TreeSources + ?Sized> HashTreeBuilder<'a, S> {
    pub fn new(sources: &'a S) -> Self {
        Self {
            sources,
            cache: ExpansionCache::new(),
            ancestors: Vec::new(),
            active: HashSet::new(),
            stats: ExpansionStats::default(),
        }
    }

    pub fn sources(&self) -> &'a S {
        self.sources
    }

    /// The memo cache accumulated so far.
    pub fn cache(&self) -> &ExpansionCache {
        &self.cache
    }

    pub const fn stats(&self) -> ExpansionStats {
        self.stats
    }

    /// Expand the trees of several roots.
    ///
    /// Roots absent from the adjacency database are skipped with a warning
    /// and do not appear in the result.
    pub fn expand_roots<I, T>(&mut self, checksums: I) -> IndexMap<String, TreeEntry>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut trees = IndexMap::new();
        for checksum in checksums {
            let checksum = checksum.as_ref();
            if self.sources.checksum_node(checksum).is_none() {
                tracing::warn!("Checksum not found in checksum DB: {checksum}");
                continue;
            }
            if trees.contains_key(checksum) {
                continue;
            }
            let tree = self.expand(checksum);
            trees.insert(checksum.to_string(), tree);
        }
        trees
    }

    /// Expand one reference line (bare checksum or composite).
    ///
    /// Non-leaf nodes in progress live on an explicit frame stack, so graph
    /// depth is not limited by the native call stack.
    pub fn expand(&mut self, reference: &str) -> TreeEntry {
        let mut frame = match self.visit(reference) {
            Visit::Done(entry) => return entry,
            Visit::Open(frame) => frame,
        };
        let mut parents: Vec<Frame<'a>> = Vec::new();

        loop {
            match frame.next_child() {
                Some(child) => match self.visit(child) {
                    Visit::Done(entry) => {
                        frame.children.insert(child.clone(), entry);
                    }
                    Visit::Open(child_frame) => {
                        parents.push(std::mem::replace(&mut frame, child_frame));
                    }
                },
                None => {
                    let key = frame.reference.clone();
                    let entry = self.close(frame);
                    match parents.pop() {
                        Some(parent) => {
                            frame = parent;
                            frame.children.insert(key, entry);
                        }
                        None => return entry,
                    }
                }
            }
        }
    }

    /// Resolve a reference from the cache, the ancestor check or a leaf
    /// record, or open a frame for its children.
    fn visit(&mut self, reference: &str) -> Visit<'a> {
        if let Some(node) = self.cache.get(reference) {
            self.stats.cache_hits += 1;
            return Visit::Done(TreeEntry::Node(Rc::clone(node)));
        }

        let node_id = reference::node_id(reference);
        if self.active.contains(node_id) {
            tracing::warn!(
                "Loop detected in hash tree for checksum {node_id}, ancestors: {:?}",
                self.ancestors
            );
            self.stats.cycles_detected += 1;
            return Visit::Done(TreeEntry::CycleDetected);
        }

        let sources: &'a S = self.sources;
        let record = sources.checksum_node(node_id);
        let mut node = ExpandedNode::default();
        if let Some(record) = record {
            node.file_path = record.file_path.clone();
            node.file_paths = record.file_paths.clone();
            node.build_cmd = record.build_cmd.clone();
        }

        match record.filter(|record| !record.is_leaf()) {
            None => Visit::Done(self.finish(reference, node, node_id)),
            Some(record) => {
                self.ancestors.push(node_id.to_string());
                self.active.insert(node_id.to_string());
                Visit::Open(Frame {
                    reference: reference.to_string(),
                    // CVE facts are recorded per content checksum
                    facts_key: NodeRef::parse(reference).blob_id().to_string(),
                    node,
                    pending: record.children().iter(),
                    children: Children::new(),
                })
            }
        }
    }

    /// All children of a frame are resolved: leave its node id's ancestry.
    fn close(&mut self, frame: Frame<'a>) -> TreeEntry {
        if let Some(node_id) = self.ancestors.pop() {
            self.active.remove(&node_id);
        }
        let Frame {
            reference,
            facts_key,
            mut node,
            children,
            ..
        } = frame;
        node.children = Some(children);
        self.finish(&reference, node, &facts_key)
    }

    fn finish(&mut self, reference: &str, mut node: ExpandedNode, facts_key: &str) -> TreeEntry {
        attach_facts(&mut node, self.sources, facts_key);

        tracing::trace!("Expanded {reference}");
        self.stats.nodes_built += 1;
        let node = Rc::new(node);
        self.cache.insert(reference.to_string(), Rc::clone(&node));
        TreeEntry::Node(node)
    }
}

/// A non-leaf node whose children are still being expanded.
struct Frame<'a> {
    reference: String,
    facts_key: String,
    node: ExpandedNode,
    pending: std::slice::Iter<'a, String>,
    children: Children,
}

impl<'a> Frame<'a> {
    /// Next child reference not expanded yet; duplicates collapse.
    fn next_child(&mut self) -> Option<&'a String> {
        let children = &self.children;
        self.pending
            .by_ref()
            .find(|child| !children.contains_key(child.as_str()))
    }
}

enum Visit<'a> {
    Done(TreeEntry),
    Open(Frame<'a>),
}

/// Attach CVE lists and build metadata recorded for `checksum`.
///
/// Fields already present on the node are never overwritten.
fn attach_facts<S: TreeSources + ?Sized>(node: &mut ExpandedNode, sources: &S, checksum: &str) {
    if let Some(record) = sources.cve_record(checksum) {
        for kind in CveListKind::ALL {
            let list = record.list(kind);
            if !list.is_empty() {
                node.set_list(kind, list.clone());
            }
        }
        if node.has_cve_lists() && node.file_path.is_none() {
            node.file_path = record.file_path.clone();
        }
    }

    if let Some(metadata) = sources.metadata_record(checksum) {
        if node.file_path.is_none() {
            node.file_path = metadata.file_path.clone();
        }
        if node.build_cmd.is_none() {
            node.build_cmd = metadata.build_cmd.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphDatabases;
    use crate::model::reference::composite_line;
    use crate::model::{
        ChecksumDatabase, ChecksumNode, CveDatabase, CveRecord, MetadataDatabase, MetadataRecord,
    };
    use std::collections::BTreeSet;

    fn checksum(c: char) -> String {
        c.to_string().repeat(40)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn adjacency(edges: &[(String, Vec<String>)]) -> ChecksumDatabase {
        edges
            .iter()
            .map(|(id, children)| (id.clone(), ChecksumNode::with_children(children.clone())))
            .collect()
    }

    #[test]
    fn test_leaf_collects_cve_and_metadata() {
        let (a, b) = (checksum('a'), checksum('b'));
        let mut cves = CveDatabase::new();
        cves.insert(
            a.clone(),
            CveRecord {
                file_path: Some("src/a.c".to_string()),
                ..CveRecord::vulnerable(["CVE-2021-1"])
            },
        );
        let metadata = MetadataDatabase::from([(
            a.clone(),
            MetadataRecord {
                file_path: Some("ignored".to_string()),
                build_cmd: Some("gcc -c a.c".to_string()),
            },
        )]);
        let dbs = GraphDatabases::new(adjacency(&[(b.clone(), vec![a.clone()])]), cves)
            .with_metadata(metadata);

        let mut builder = HashTreeBuilder::new(&dbs);
        let tree = builder.expand(&b);
        let root = tree.as_node().unwrap();
        let leaf = root.children.as_ref().unwrap()[&a].as_node().unwrap();

        assert!(leaf.is_leaf());
        assert_eq!(leaf.cve_list, Some(set(&["CVE-2021-1"])));
        assert_eq!(leaf.fixed_cve_list, None);
        assert_eq!(leaf.file_path.as_deref(), Some("src/a.c"));
        assert_eq!(leaf.build_cmd.as_deref(), Some("gcc -c a.c"));
        assert_eq!(root.cve_list, None);
    }

    #[test]
    fn test_cve_file_path_requires_cve_lists() {
        let a = checksum('a');
        let mut cves = CveDatabase::new();
        cves.insert(
            a.clone(),
            CveRecord {
                file_path: Some("src/a.c".to_string()),
                ..CveRecord::default()
            },
        );
        let dbs = GraphDatabases::new(ChecksumDatabase::new(), cves);
        let mut builder = HashTreeBuilder::new(&dbs);
        let tree = builder.expand(&a);
        assert_eq!(tree.as_node().unwrap().file_path, None);
    }

    #[test]
    fn test_non_leaf_facts_use_blob_id() {
        let (blob, bom, leaf) = (checksum('a'), checksum('c'), checksum('d'));
        let line = composite_line(&blob, &bom);
        let root = checksum('b');
        let mut cves = CveDatabase::new();
        cves.insert(blob.clone(), CveRecord::vulnerable(["CVE-BLOB"]));
        cves.insert(bom.clone(), CveRecord::vulnerable(["CVE-BOM"]));
        let dbs = GraphDatabases::new(
            adjacency(&[(root.clone(), vec![line.clone()]), (bom, vec![leaf])]),
            cves,
        );

        let mut builder = HashTreeBuilder::new(&dbs);
        let tree = builder.expand(&root);
        let composite = tree.as_node().unwrap().children.as_ref().unwrap()[&line]
            .as_node()
            .unwrap();
        assert!(!composite.is_leaf());
        assert_eq!(composite.cve_list, Some(set(&["CVE-BLOB"])));
    }

    #[test]
    fn test_self_cycle_is_cut() {
        let (x, a) = (checksum('e'), checksum('a'));
        let mut cves = CveDatabase::new();
        cves.insert(a.clone(), CveRecord::vulnerable(["CVE-1"]));
        let dbs = GraphDatabases::new(adjacency(&[(x.clone(), vec![x.clone(), a.clone()])]), cves);

        let mut builder = HashTreeBuilder::new(&dbs);
        let tree = builder.expand(&x);
        let children = tree.as_node().unwrap().children.as_ref().unwrap();
        assert!(children[&x].is_cycle());
        assert!(children[&a].as_node().is_some());
        assert_eq!(builder.stats().cycles_detected, 1);
        assert!(!builder.cache().is_empty());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let (top, left, right, shared) = (checksum('1'), checksum('2'), checksum('3'), checksum('4'));
        let dbs = GraphDatabases::new(
            adjacency(&[
                (top.clone(), vec![left.clone(), right.clone()]),
                (left, vec![shared.clone()]),
                (right, vec![shared]),
            ]),
            CveDatabase::new(),
        );

        let mut builder = HashTreeBuilder::new(&dbs);
        builder.expand(&top);
        let stats = builder.stats();
        assert_eq!(stats.cycles_detected, 0);
        assert_eq!(stats.nodes_built, 4);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_duplicate_children_collapse() {
        let (root, a) = (checksum('b'), checksum('a'));
        let dbs = GraphDatabases::new(
            adjacency(&[(root.clone(), vec![a.clone(), a.clone()])]),
            CveDatabase::new(),
        );
        let mut builder = HashTreeBuilder::new(&dbs);
        let tree = builder.expand(&root);
        assert_eq!(tree.as_node().unwrap().children.as_ref().unwrap().len(), 1);
        assert_eq!(builder.stats().cache_hits, 0);
    }

    #[test]
    fn test_empty_hash_tree_is_leaf() {
        let a = checksum('a');
        let dbs = GraphDatabases::new(adjacency(&[(a.clone(), Vec::new())]), CveDatabase::new());
        let mut builder = HashTreeBuilder::new(&dbs);
        assert!(builder.expand(&a).as_node().unwrap().is_leaf());
    }

    #[test]
    fn test_expand_roots_skips_unknown() {
        let (root, a) = (checksum('b'), checksum('a'));
        let dbs = GraphDatabases::new(adjacency(&[(root.clone(), vec![a.clone()])]), CveDatabase::new());
        let mut builder = HashTreeBuilder::new(&dbs);
        let trees = builder.expand_roots([root.as_str(), a.as_str()]);
        assert_eq!(trees.keys().collect::<Vec<_>>(), [&root]);
    }

    #[test]
    fn test_record_metadata_is_kept() {
        let (root, a) = (checksum('b'), checksum('a'));
        let mut checksums = adjacency(&[(root.clone(), vec![a])]);
        checksums[&root].build_cmd = Some("ld -o b a.o".to_string());
        checksums[&root].file_paths = Some(vec!["b".to_string(), "out/b".to_string()]);
        let dbs = GraphDatabases::new(checksums, CveDatabase::new());

        let mut builder = HashTreeBuilder::new(&dbs);
        let tree = builder.expand(&root);
        let node = tree.as_node().unwrap();
        assert_eq!(node.build_cmd.as_deref(), Some("ld -o b a.o"));
        assert_eq!(node.file_paths.as_ref().map(Vec::len), Some(2));
    }
}
