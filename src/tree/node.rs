//! Immutable, path-addressed file tree node.
//!
//! Nodes are always handled as `Arc<FileTreeNode>` and never change once
//! built. Every update returns a node: the same `Arc` when the requested
//! state equals the current one, otherwise a new node that shares all
//! untouched subtrees with the old one. Callers can therefore detect "no
//! change" with `Arc::ptr_eq`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, TreeError};
use crate::tree::children::Children;
use crate::tree::context::TreeContext;
use crate::tree::uri;

/// Checkbox state of a node while a working set is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckedStatus {
    Clear,
    Checked,
    Partial,
}

impl CheckedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckedStatus::Clear => "clear",
            CheckedStatus::Checked => "checked",
            CheckedStatus::Partial => "partial",
        }
    }
}

/// Property bag for [`FileTreeNode::create`].
///
/// `uri` and `root_uri` are required; everything else falls back to its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeProps {
    pub uri: Option<String>,
    pub root_uri: Option<String>,
    pub is_expanded: Option<bool>,
    pub is_loading: Option<bool>,
    pub is_cwd: Option<bool>,
    pub is_selected: Option<bool>,
    pub highlighted_text: Option<String>,
    #[serde(skip)]
    pub children: Option<Children>,
}

impl NodeProps {
    pub fn new(uri: impl Into<String>, root_uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            root_uri: Some(root_uri.into()),
            ..Default::default()
        }
    }

    pub fn expanded(mut self, value: bool) -> Self {
        self.is_expanded = Some(value);
        self
    }

    pub fn loading(mut self, value: bool) -> Self {
        self.is_loading = Some(value);
        self
    }

    pub fn cwd(mut self, value: bool) -> Self {
        self.is_cwd = Some(value);
        self
    }

    pub fn selected(mut self, value: bool) -> Self {
        self.is_selected = Some(value);
        self
    }

    pub fn highlighted_text(mut self, text: impl Into<String>) -> Self {
        self.highlighted_text = Some(text.into());
        self
    }

    pub fn children(mut self, children: Children) -> Self {
        self.children = Some(children);
        self
    }
}

/// Fields to change in one [`FileTreeNode::set`] call. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub is_expanded: Option<bool>,
    pub is_loading: Option<bool>,
    pub is_cwd: Option<bool>,
    pub is_selected: Option<bool>,
    pub highlighted_text: Option<String>,
    pub children: Option<Children>,
}

/// One file or directory entry in a rooted hierarchy.
#[derive(Debug, Clone)]
pub struct FileTreeNode {
    uri: String,
    root_uri: String,
    name: String,
    is_expanded: bool,
    is_loading: bool,
    is_cwd: bool,
    is_selected: bool,
    highlighted_text: String,
    children: Children,
    context: Arc<TreeContext>,
}

impl FileTreeNode {
    /// Build a node from `props`, bound to `context`.
    ///
    /// Fails with `InvalidNodeSpec` only when `uri` or `root_uri` is missing.
    /// Children are taken as given: placing them is the caller's job, and
    /// `set_children` follows the same rule.
    pub fn create(props: NodeProps, context: &Arc<TreeContext>) -> Result<Arc<Self>> {
        let uri = props
            .uri
            .ok_or_else(|| TreeError::InvalidNodeSpec("uri is required".into()))?;
        let root_uri = props
            .root_uri
            .ok_or_else(|| TreeError::InvalidNodeSpec("root_uri is required".into()))?;

        let children = props.children.unwrap_or_default();

        Ok(Arc::new(Self {
            name: uri::basename(&uri).to_string(),
            uri,
            root_uri,
            is_expanded: props.is_expanded.unwrap_or(false),
            is_loading: props.is_loading.unwrap_or(false),
            is_cwd: props.is_cwd.unwrap_or(false),
            is_selected: props.is_selected.unwrap_or(false),
            highlighted_text: props.highlighted_text.unwrap_or_default(),
            children,
            context: Arc::clone(context),
        }))
    }

    /// Ordered children mapping from sibling nodes, keyed by name.
    pub fn children_from_array<I>(nodes: I) -> Result<Children>
    where
        I: IntoIterator<Item = Arc<FileTreeNode>>,
    {
        Children::from_nodes(nodes)
    }

    // ── Stored fields ────────────────────────────────────────────────────

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_cwd(&self) -> bool {
        self.is_cwd
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn highlighted_text(&self) -> &str {
        &self.highlighted_text
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn context(&self) -> &Arc<TreeContext> {
        &self.context
    }

    // ── Derived properties ───────────────────────────────────────────────

    /// Final path segment of the uri.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_path(&self) -> &str {
        uri::relative(&self.root_uri, &self.uri)
    }

    pub fn local_path(&self) -> &str {
        uri::local_path(&self.uri)
    }

    pub fn is_container(&self) -> bool {
        uri::is_directory(&self.uri)
    }

    pub fn is_root(&self) -> bool {
        self.uri == self.root_uri
    }

    pub fn is_ignored(&self) -> bool {
        self.context.is_ignored(&self.name)
    }

    /// Whether the node passes the ignore, hidden-file and working-set checks.
    pub fn should_be_shown(&self) -> bool {
        let ctx = &self.context;
        if ctx.hide_ignored_names && self.is_ignored() {
            return false;
        }
        if !ctx.show_hidden && !self.is_root() && self.name.starts_with('.') {
            return false;
        }
        if ctx.editing.is_some() || ctx.working_set.is_empty() || self.is_root() {
            return true;
        }
        if self.is_container() {
            ctx.working_set.contains_dir(&self.uri)
        } else {
            ctx.working_set.contains_file(&self.uri)
        }
    }

    pub fn checked_status(&self) -> CheckedStatus {
        let Some(editing) = &self.context.editing else {
            return CheckedStatus::Clear;
        };
        if editing.contains_file(&self.uri) {
            CheckedStatus::Checked
        } else if self.is_container() && editing.contains_dir(&self.uri) {
            CheckedStatus::Partial
        } else {
            CheckedStatus::Clear
        }
    }

    /// True while editing a working set for nodes the active set leaves out;
    /// they are still shown, but dimmed.
    pub fn should_be_softened(&self) -> bool {
        let ctx = &self.context;
        if ctx.editing.is_none() || ctx.working_set.is_empty() {
            return false;
        }
        let covered = if self.is_container() {
            ctx.working_set.contains_dir(&self.uri)
        } else {
            ctx.working_set.contains_file(&self.uri)
        };
        !covered
    }

    /// Whether this node or any descendant matches the active filter.
    pub fn matches_filter(&self) -> bool {
        self.context.name_matches(&self.name) || self.children.iter().any(|c| c.matches_filter())
    }

    /// Whether this node or any descendant is selected.
    pub fn contains_selection(&self) -> bool {
        self.is_selected || self.children.iter().any(|c| c.contains_selection())
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    // ── Updates ──────────────────────────────────────────────────────────

    pub fn set_is_expanded(self: &Arc<Self>, value: bool) -> Arc<Self> {
        self.set(NodeUpdate {
            is_expanded: Some(value),
            ..Default::default()
        })
    }

    pub fn set_is_loading(self: &Arc<Self>, value: bool) -> Arc<Self> {
        self.set(NodeUpdate {
            is_loading: Some(value),
            ..Default::default()
        })
    }

    pub fn set_is_cwd(self: &Arc<Self>, value: bool) -> Arc<Self> {
        self.set(NodeUpdate {
            is_cwd: Some(value),
            ..Default::default()
        })
    }

    pub fn set_is_selected(self: &Arc<Self>, value: bool) -> Arc<Self> {
        self.set(NodeUpdate {
            is_selected: Some(value),
            ..Default::default()
        })
    }

    pub fn set_highlighted_text(self: &Arc<Self>, text: impl Into<String>) -> Arc<Self> {
        self.set(NodeUpdate {
            highlighted_text: Some(text.into()),
            ..Default::default()
        })
    }

    /// Apply every supplied field at once.
    ///
    /// Returns `self` when all supplied values already match; otherwise a
    /// single new node carrying all of the changes.
    pub fn set(self: &Arc<Self>, update: NodeUpdate) -> Arc<Self> {
        if self.unchanged_by(&update) {
            return Arc::clone(self);
        }
        let mut next = FileTreeNode::clone(self);
        if let Some(value) = update.is_expanded {
            next.is_expanded = value;
        }
        if let Some(value) = update.is_loading {
            next.is_loading = value;
        }
        if let Some(value) = update.is_cwd {
            next.is_cwd = value;
        }
        if let Some(value) = update.is_selected {
            next.is_selected = value;
        }
        if let Some(text) = update.highlighted_text {
            next.highlighted_text = text;
        }
        if let Some(children) = update.children {
            next.children = children;
        }
        Arc::new(next)
    }

    fn unchanged_by(&self, update: &NodeUpdate) -> bool {
        update.is_expanded.map_or(true, |v| v == self.is_expanded)
            && update.is_loading.map_or(true, |v| v == self.is_loading)
            && update.is_cwd.map_or(true, |v| v == self.is_cwd)
            && update.is_selected.map_or(true, |v| v == self.is_selected)
            && update
                .highlighted_text
                .as_ref()
                .map_or(true, |t| *t == self.highlighted_text)
            && update
                .children
                .as_ref()
                .map_or(true, |c| *c == self.children)
    }

    /// Replace the children mapping; `self` is kept when `children` equals
    /// the current mapping (same names, same order, identical nodes).
    pub fn set_children(self: &Arc<Self>, children: Children) -> Arc<Self> {
        self.set(NodeUpdate {
            children: Some(children),
            ..Default::default()
        })
    }

    /// Replace the child that has the same name as `child`.
    ///
    /// Fails with `ChildNotFound` when no such child exists; it never inserts.
    /// Like `create` and `set_children`, it does not check where `child`'s
    /// uri points.
    pub fn update_child(self: &Arc<Self>, child: Arc<FileTreeNode>) -> Result<Arc<Self>> {
        match self.children.get(child.name()) {
            None => Err(TreeError::ChildNotFound {
                parent: self.uri.clone(),
                name: child.name().to_string(),
            }),
            Some(existing) if Arc::ptr_eq(existing, &child) => Ok(Arc::clone(self)),
            Some(_) => Ok(self.set_children(self.children.with_child(child))),
        }
    }

    /// Post-order walk applying `transform` to every node for which
    /// `predicate` is absent or true.
    ///
    /// Parents are rebuilt only when a child changed, so a transform that
    /// changes nothing returns `self`. A transform that renames a node moves
    /// it to the key of its new name.
    pub fn set_recursive<F>(
        self: &Arc<Self>,
        predicate: Option<&dyn Fn(&FileTreeNode) -> bool>,
        transform: F,
    ) -> Arc<Self>
    where
        F: Fn(&Arc<FileTreeNode>) -> Arc<FileTreeNode>,
    {
        self.set_recursive_inner(predicate, &transform)
    }

    fn set_recursive_inner(
        self: &Arc<Self>,
        predicate: Option<&dyn Fn(&FileTreeNode) -> bool>,
        transform: &dyn Fn(&Arc<FileTreeNode>) -> Arc<FileTreeNode>,
    ) -> Arc<Self> {
        let mut changed = false;
        let rebuilt: Vec<Arc<FileTreeNode>> = self
            .children
            .iter()
            .map(|child| {
                let next = child.set_recursive_inner(predicate, transform);
                changed |= !Arc::ptr_eq(&next, child);
                next
            })
            .collect();

        let node = if changed {
            self.set_children(self.children.rebuilt(rebuilt))
        } else {
            Arc::clone(self)
        };

        if predicate.map_or(true, |p| p(&node)) {
            transform(&node)
        } else {
            node
        }
    }

    /// Apply `update` to the node at `target` and rebuild the path to it.
    ///
    /// A container may be named with or without its trailing separator, as
    /// with `find_deepest`. Returns `self` when `update` changes nothing.
    /// Fails with `ChildNotFound` when `target` is not in this subtree.
    pub fn update_descendant<F>(self: &Arc<Self>, target: &str, update: F) -> Result<Arc<Self>>
    where
        F: FnOnce(&Arc<FileTreeNode>) -> Arc<FileTreeNode>,
    {
        if uri::trim_trailing_separator(target) == uri::trim_trailing_separator(&self.uri) {
            return Ok(update(self));
        }
        let missing = |name: &str| TreeError::ChildNotFound {
            parent: self.uri.clone(),
            name: name.to_string(),
        };
        if !self.is_container() || !target.starts_with(&self.uri) {
            return Err(missing(target));
        }
        let rest = &target[self.uri.len()..];
        let name = uri::segments(rest).next().ok_or_else(|| missing(rest))?;
        let child = self.children.get(name).ok_or_else(|| missing(name))?;

        let updated = child.update_descendant(target, update)?;
        if Arc::ptr_eq(&updated, child) {
            return Ok(Arc::clone(self));
        }
        trace!(parent = %self.uri, child = %updated.uri, "rebuilding path to updated node");
        self.update_child(updated)
    }

    /// Rebuild this subtree against another context.
    pub fn with_context(self: &Arc<Self>, context: &Arc<TreeContext>) -> Arc<Self> {
        if Arc::ptr_eq(&self.context, context) {
            return Arc::clone(self);
        }
        self.set_recursive(None, |node| {
            if Arc::ptr_eq(&node.context, context) {
                return Arc::clone(node);
            }
            let mut next = FileTreeNode::clone(node);
            next.context = Arc::clone(context);
            Arc::new(next)
        })
    }

    /// Store the active filter text in `highlighted_text` of every node whose
    /// name matches it, clearing it everywhere else.
    pub fn apply_filter_highlights(self: &Arc<Self>) -> Arc<Self> {
        self.set_recursive(None, |node| {
            let ctx = &node.context;
            let text = if ctx.has_filter() && ctx.name_matches(&node.name) {
                ctx.filter().to_string()
            } else {
                String::new()
            };
            node.set_highlighted_text(text)
        })
    }

    /// Mark the node whose uri is the context's cwd, unmarking all others.
    pub fn sync_cwd(self: &Arc<Self>) -> Arc<Self> {
        self.set_recursive(None, |node| {
            let is_cwd = node.context.cwd.as_deref().is_some_and(|cwd| {
                uri::trim_trailing_separator(cwd) == uri::trim_trailing_separator(&node.uri)
            });
            node.set_is_cwd(is_cwd)
        })
    }

    // ── Lookup ───────────────────────────────────────────────────────────

    /// The node whose uri is exactly `target`, if it lies in this subtree.
    pub fn find<'a>(self: &'a Arc<Self>, target: &str) -> Option<&'a Arc<Self>> {
        self.find_deepest(target).filter(|node| node.uri == target)
    }

    /// The deepest node on the path to `target`.
    ///
    /// Walks `target`'s segments below this node's uri and stops at the
    /// first one missing from `children`. Returns `None` when `target` does
    /// not start with this node's uri.
    pub fn find_deepest<'a>(self: &'a Arc<Self>, target: &str) -> Option<&'a Arc<Self>> {
        if target == self.uri {
            return Some(self);
        }
        if !self.is_container() || !target.starts_with(&self.uri) {
            return None;
        }
        let mut current = self;
        for segment in uri::segments(&target[self.uri.len()..]) {
            match current.children.get(segment) {
                Some(child) => current = child,
                None => break,
            }
        }
        Some(current)
    }

    /// Last node in display order: follows the last shown child through
    /// expanded containers.
    pub fn last_visible_descendant<'a>(self: &'a Arc<Self>) -> &'a Arc<Self> {
        let mut current = self;
        while current.is_container() && current.is_expanded {
            match current.children.iter().rev().find(|c| c.should_be_shown()) {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }
}
