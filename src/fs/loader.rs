//! Builds file trees from a real directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::tree::{uri, Children, FileTreeNode, NodeProps, NodeUpdate, TreeContext};

/// Sort criteria for children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Alphabetical (case-insensitive), default.
    Name,
    /// By file size (largest first).
    Size,
    /// By modification time (newest first).
    Modified,
}

impl SortBy {
    /// Parse sort_by from config string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "size" => SortBy::Size,
            "modified" => SortBy::Modified,
            _ => SortBy::Name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Name => "name",
            SortBy::Size => "size",
            SortBy::Modified => "modified",
        }
    }
}

/// How deep and in which order directories are read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Containers shallower than this are read and expanded.
    pub max_depth: usize,
    pub sort_by: SortBy,
    /// Whether directories are listed before files.
    pub dirs_first: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            sort_by: SortBy::Name,
            dirs_first: true,
        }
    }
}

struct Entry {
    path: PathBuf,
    name: String,
    is_dir: bool,
    size: u64,
    modified: Option<SystemTime>,
}

/// Load the directory at `path` as a tree bound to `context`.
///
/// The root uri is the canonical path with a trailing separator.
pub fn load_tree(
    path: &Path,
    context: &Arc<TreeContext>,
    options: &LoadOptions,
) -> Result<Arc<FileTreeNode>> {
    let root_path = path
        .canonicalize()
        .map_err(|_| TreeError::InvalidPath(format!("{} does not exist", path.display())))?;
    if !root_path.is_dir() {
        return Err(TreeError::InvalidPath(format!(
            "{} is not a directory",
            root_path.display()
        )));
    }
    let root_uri = uri::ensure_trailing_separator(&root_path.to_string_lossy());
    debug!(root = %root_uri, depth = options.max_depth, sort = options.sort_by.label(), "loading tree");
    build_dir(&root_path, &root_uri, &root_uri, 0, context, options)
}

/// Read the immediate children of a container and expand it.
///
/// Children whose uri is unchanged keep their existing node, so state below
/// them survives a reload; an unchanged directory returns `node` itself.
pub fn load_children(node: &Arc<FileTreeNode>, options: &LoadOptions) -> Result<Arc<FileTreeNode>> {
    if !node.is_container() {
        return Ok(Arc::clone(node));
    }
    let immediate = LoadOptions {
        max_depth: 1,
        ..options.clone()
    };
    let children = read_children(
        Path::new(node.local_path()),
        node.uri(),
        node.root_uri(),
        1,
        node.context(),
        &immediate,
        Some(node.children()),
    )?;
    Ok(node.set(NodeUpdate {
        is_expanded: Some(true),
        is_loading: Some(false),
        children: Some(children),
        ..Default::default()
    }))
}

fn build_dir(
    path: &Path,
    dir_uri: &str,
    root_uri: &str,
    depth: usize,
    context: &Arc<TreeContext>,
    options: &LoadOptions,
) -> Result<Arc<FileTreeNode>> {
    let expand = depth < options.max_depth;
    let mut props = NodeProps::new(dir_uri, root_uri).expanded(expand);
    if expand {
        props.children = Some(read_children(
            path, dir_uri, root_uri, depth, context, options, None,
        )?);
    }
    FileTreeNode::create(props, context)
}

fn read_children(
    path: &Path,
    dir_uri: &str,
    root_uri: &str,
    depth: usize,
    context: &Arc<TreeContext>,
    options: &LoadOptions,
    existing: Option<&Children>,
) -> Result<Children> {
    let mut entries = read_entries(path)?;
    sort_entries(&mut entries, options.sort_by, options.dirs_first);

    let mut nodes = Vec::with_capacity(entries.len());
    for entry in entries {
        let child_uri = uri::join(dir_uri, &entry.name, entry.is_dir);
        if let Some(previous) = existing
            .and_then(|children| children.get(&entry.name))
            .filter(|previous| previous.uri() == child_uri)
        {
            nodes.push(Arc::clone(previous));
            continue;
        }

        let node = if entry.is_dir {
            match build_dir(&entry.path, &child_uri, root_uri, depth + 1, context, options) {
                Ok(node) => node,
                Err(e) => {
                    debug!(path = %entry.path.display(), error = %e, "leaving unreadable directory collapsed");
                    FileTreeNode::create(NodeProps::new(child_uri, root_uri), context)?
                }
            }
        } else {
            FileTreeNode::create(NodeProps::new(child_uri, root_uri), context)?
        };
        nodes.push(node);
    }
    Children::from_nodes(nodes)
}

/// Permission-denied entries and broken symlinks are skipped.
fn read_entries(dir: &Path) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping entry without metadata");
                continue;
            }
        };
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().to_string(),
            path,
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        });
    }
    Ok(entries)
}

fn sort_entries(entries: &mut [Entry], sort_by: SortBy, dirs_first: bool) {
    entries.sort_by(|a, b| {
        let mut cmp = std::cmp::Ordering::Equal;

        if dirs_first {
            cmp = b.is_dir.cmp(&a.is_dir);
        }

        cmp.then_with(|| match sort_by {
            SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortBy::Size => b.size.cmp(&a.size),
            SortBy::Modified => b.modified.cmp(&a.modified),
        })
    });
}
