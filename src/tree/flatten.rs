use std::sync::Arc;

use serde::Serialize;

use crate::tree::node::{CheckedStatus, FileTreeNode};

/// A flattened representation of a tree node, one per visible row.
#[derive(Debug, Clone, Serialize)]
pub struct FlatItem {
    pub uri: String,
    pub name: String,
    pub depth: usize,
    pub is_container: bool,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
    pub is_selected: bool,
    pub checked_status: CheckedStatus,
    pub softened: bool,
    pub highlighted_text: String,
}

/// Rows a tree view would show for `root`, in display order.
///
/// The root is always included. Only expanded containers are descended,
/// except that with an active filter every container holding a match is
/// opened so the match stays reachable.
pub fn flatten(root: &Arc<FileTreeNode>) -> Vec<FlatItem> {
    let mut items = Vec::new();
    flatten_node(root, &mut items, 0, true, true);
    items
}

fn flatten_node(
    node: &FileTreeNode,
    items: &mut Vec<FlatItem>,
    depth: usize,
    is_last: bool,
    is_root: bool,
) {
    if !is_root && !is_visible(node) {
        return;
    }

    let filtering = node.context().has_filter();
    let is_expanded =
        node.is_expanded() || (filtering && node.is_container() && node.matches_filter());

    items.push(FlatItem {
        uri: node.uri().to_string(),
        name: node.name().to_string(),
        depth,
        is_container: node.is_container(),
        is_expanded,
        is_last_sibling: is_last,
        is_selected: node.is_selected(),
        checked_status: node.checked_status(),
        softened: node.should_be_softened(),
        highlighted_text: node.highlighted_text().to_string(),
    });

    if is_expanded {
        let visible_children: Vec<&Arc<FileTreeNode>> =
            node.children().iter().filter(|c| is_visible(c)).collect();
        for (i, child) in visible_children.iter().enumerate() {
            let is_last_child = i == visible_children.len() - 1;
            flatten_node(child, items, depth + 1, is_last_child, false);
        }
    }
}

fn is_visible(node: &FileTreeNode) -> bool {
    node.should_be_shown() && node.matches_filter()
}
