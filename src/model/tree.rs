//! Expanded hash trees.
//!
//! An [`ExpandedNode`] keeps its children apart from its named metadata
//! fields, so traversal and aggregation never need to special-case reserved
//! key names. Subtrees are shared through `Rc` and never mutated after they
//! are built.

use super::records::CveListKind;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Marker emitted in place of a subtree whose node id is already on the
/// active expansion path.
pub const RECURSION_LOOP_DETECTED: &str = "RECURSION_LOOP_DETECTED";

/// Child reference line → expansion result.
pub type Children = BTreeMap<String, TreeEntry>;

/// One node of an expanded hash tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpandedNode {
    /// `None` for leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,
    #[serde(rename = "CVElist", skip_serializing_if = "Option::is_none")]
    pub cve_list: Option<BTreeSet<String>>,
    #[serde(rename = "FixedCVElist", skip_serializing_if = "Option::is_none")]
    pub fixed_cve_list: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_cmd: Option<String>,
}

impl ExpandedNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// The node's own CVE list of the given kind.
    pub const fn list(&self, kind: CveListKind) -> Option<&BTreeSet<String>> {
        match kind {
            CveListKind::Vulnerable => self.cve_list.as_ref(),
            CveListKind::Fixed => self.fixed_cve_list.as_ref(),
        }
    }

    pub(crate) fn set_list(&mut self, kind: CveListKind, list: BTreeSet<String>) {
        match kind {
            CveListKind::Vulnerable => self.cve_list = Some(list),
            CveListKind::Fixed => self.fixed_cve_list = Some(list),
        }
    }

    /// Whether either CVE list has been attached.
    pub const fn has_cve_lists(&self) -> bool {
        self.cve_list.is_some() || self.fixed_cve_list.is_some()
    }
}

impl Drop for ExpandedNode {
    // Deep chains would otherwise be freed one native stack frame per level.
    fn drop(&mut self) {
        let Some(children) = self.children.take() else {
            return;
        };
        let mut pending: Vec<Rc<ExpandedNode>> = children
            .into_values()
            .filter_map(TreeEntry::into_node)
            .collect();
        while let Some(node) = pending.pop() {
            if let Ok(mut node) = Rc::try_unwrap(node) {
                if let Some(children) = node.children.take() {
                    pending.extend(children.into_values().filter_map(TreeEntry::into_node));
                }
            }
        }
    }
}

/// Result of expanding one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    /// A fully expanded (possibly shared) subtree.
    Node(Rc<ExpandedNode>),
    /// The reference closed a cycle; expansion stopped here.
    CycleDetected,
}

impl TreeEntry {
    pub fn as_node(&self) -> Option<&ExpandedNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::CycleDetected => None,
        }
    }

    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::CycleDetected)
    }

    pub fn into_node(self) -> Option<Rc<ExpandedNode>> {
        match self {
            Self::Node(node) => Some(node),
            Self::CycleDetected => None,
        }
    }
}

impl From<ExpandedNode> for TreeEntry {
    fn from(node: ExpandedNode) -> Self {
        Self::Node(Rc::new(node))
    }
}

impl Serialize for TreeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Node(node) => node.serialize(serializer),
            Self::CycleDetected => serializer.serialize_str(RECURSION_LOOP_DETECTED),
        }
    }
}
