//! CVE aggregation over expanded hash trees.

use crate::model::{CveListKind, ExpandedNode, TreeEntry};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Union of one CVE list over every node reachable from `entry`.
///
/// Cycle sentinels contribute nothing. Shared subtrees are visited once.
pub fn collect_cve_list(entry: &TreeEntry, kind: CveListKind) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let Some(root) = entry.as_node() else {
        return found;
    };

    let mut visited: HashSet<*const ExpandedNode> = HashSet::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if !visited.insert(node as *const ExpandedNode) {
            continue;
        }
        if let Some(list) = node.list(kind) {
            found.extend(list.iter().cloned());
        }
        if let Some(children) = &node.children {
            pending.extend(children.values().filter_map(TreeEntry::as_node));
        }
    }
    found
}

/// Both aggregated CVE lists of one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CveSummary {
    #[serde(rename = "CVElist")]
    pub cve_list: BTreeSet<String>,
    #[serde(rename = "FixedCVElist")]
    pub fixed_cve_list: BTreeSet<String>,
}

impl CveSummary {
    pub fn has_cves(&self) -> bool {
        !self.cve_list.is_empty()
    }
}

/// Aggregate both lists of a tree.
pub fn summarize(entry: &TreeEntry) -> CveSummary {
    CveSummary {
        cve_list: collect_cve_list(entry, CveListKind::Vulnerable),
        fixed_cve_list: collect_cve_list(entry, CveListKind::Fixed),
    }
}
