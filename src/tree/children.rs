use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, TreeError};
use crate::tree::node::FileTreeNode;

/// Persistent ordered mapping from child name to child node.
///
/// Clones share the underlying map. Every update produces a new map holding
/// the same `Arc`s for the untouched children, so sibling subtrees are shared
/// between tree versions. Entries are always keyed by the child's `name`.
#[derive(Debug, Clone, Default)]
pub struct Children {
    map: Arc<IndexMap<String, Arc<FileTreeNode>>>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from sibling nodes, keeping their order.
    pub fn from_nodes<I>(nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<FileTreeNode>>,
    {
        let mut map = IndexMap::new();
        for node in nodes {
            let name = node.name().to_string();
            if map.contains_key(&name) {
                return Err(TreeError::DuplicateChildName(name));
            }
            map.insert(name, node);
        }
        Ok(Self { map: Arc::new(map) })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FileTreeNode>> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<FileTreeNode>> + ExactSizeIterator {
        self.map.values()
    }

    pub fn first(&self) -> Option<&Arc<FileTreeNode>> {
        self.map.first().map(|(_, node)| node)
    }

    pub fn last(&self) -> Option<&Arc<FileTreeNode>> {
        self.map.last().map(|(_, node)| node)
    }

    /// New mapping with `node` replacing the entry of the same name, or
    /// appended when there is none.
    pub fn with_child(&self, node: Arc<FileTreeNode>) -> Self {
        let mut map = (*self.map).clone();
        map.insert(node.name().to_string(), node);
        Self { map: Arc::new(map) }
    }

    /// New mapping without the entry `name`; order of the rest is kept.
    pub fn without(&self, name: &str) -> Self {
        if !self.map.contains_key(name) {
            return self.clone();
        }
        let mut map = (*self.map).clone();
        map.shift_remove(name);
        Self { map: Arc::new(map) }
    }

    /// Mapping of `nodes`, one per existing entry in the same order, each
    /// keyed by its own name. A renamed node moves to its new key; if that
    /// collides with a sibling, the later node wins the earlier position.
    pub(crate) fn rebuilt(&self, nodes: Vec<Arc<FileTreeNode>>) -> Self {
        debug_assert_eq!(nodes.len(), self.map.len());
        let map = nodes
            .into_iter()
            .map(|node| (node.name().to_string(), node))
            .collect();
        Self { map: Arc::new(map) }
    }

    /// Whether both mappings share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.map, &other.map)
    }
}

/// Ordered comparison: same names in the same order, each mapped to the
/// identical node.
impl PartialEq for Children {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.map.len() == other.map.len()
            && self
                .map
                .iter()
                .zip(other.map.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && Arc::ptr_eq(a, b))
    }
}

impl Eq for Children {}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Arc<FileTreeNode>;
    type IntoIter = indexmap::map::Values<'a, String, Arc<FileTreeNode>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.values()
    }
}
