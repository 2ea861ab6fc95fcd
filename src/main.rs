use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use filetree::config::{
    AppConfig, FilterConfig, GeneralConfig, LoggingConfig, TreeConfig, WorkingSetConfig,
};
use filetree::error::Result;
use filetree::fs::load_tree;
use filetree::logging::init_logging;
use filetree::tree::{flatten, FileTreeNode, FlatItem};

/// Inspect a directory as an immutable file tree.
#[derive(Parser, Debug)]
#[command(name = "ftree", version, about)]
struct Cli {
    /// Root path to load (defaults to the configured path, then ".")
    path: Option<PathBuf>,

    /// Explicit config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only show entries whose name matches, plus their ancestors
    #[arg(long)]
    filter: Option<String>,

    /// Match the filter as a subsequence instead of a substring
    #[arg(long)]
    fuzzy: bool,

    /// Show dot-files
    #[arg(long)]
    show_hidden: bool,

    /// Directory levels to read
    #[arg(long)]
    depth: Option<usize>,

    /// Sort order
    #[arg(long, value_parser = ["name", "size", "modified"])]
    sort: Option<String>,

    /// Restrict the tree to these uris
    #[arg(long = "working-set", num_args = 1..)]
    working_set: Vec<String>,

    /// Print the node at this uri (absolute, or relative to the root)
    #[arg(long, conflicts_with = "find_deepest")]
    find: Option<String>,

    /// Print the deepest existing node on the path to this uri
    #[arg(long)]
    find_deepest: Option<String>,

    /// Print rows as JSON
    #[arg(long)]
    json: bool,

    /// Log level or filter directive
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Partial config carrying only the flags that were given.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: None,
                show_hidden: self.show_hidden.then_some(true),
            },
            tree: TreeConfig {
                sort_by: self.sort.clone(),
                max_depth: self.depth,
                ..Default::default()
            },
            filter: FilterConfig {
                text: self.filter.clone(),
                mode: self.fuzzy.then(|| "fuzzy".to_string()),
            },
            working_set: WorkingSetConfig {
                uris: (!self.working_set.is_empty()).then(|| self.working_set.clone()),
            },
            logging: LoggingConfig {
                level: self.log_level.clone(),
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    init_logging(config.log_level());

    let path = cli
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.default_path()));
    let context = config.tree_context()?;
    let root = load_tree(&path, &context, &config.load_options())?.apply_filter_highlights();
    info!(root = root.uri(), nodes = root.node_count(), "tree loaded");

    if let Some(target) = cli.find.as_deref() {
        let target = resolve_target(&root, target);
        println!("{}", describe(root.find(&target)));
        return Ok(());
    }
    if let Some(target) = cli.find_deepest.as_deref() {
        let target = resolve_target(&root, target);
        println!("{}", describe(root.find_deepest(&target)));
        return Ok(());
    }

    let items = flatten(&root);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for item in &items {
            println!("{}", render_row(item));
        }
    }
    Ok(())
}

/// Absolute uris are used as given; anything else is taken relative to the root.
fn resolve_target(root: &FileTreeNode, target: &str) -> String {
    if target.starts_with(root.root_uri()) {
        target.to_string()
    } else {
        format!("{}{}", root.root_uri(), target.trim_start_matches('/'))
    }
}

fn describe(node: Option<&Arc<FileTreeNode>>) -> String {
    match node {
        Some(node) => node.uri().to_string(),
        None => "not found".to_string(),
    }
}

fn render_row(item: &FlatItem) -> String {
    let indent = "  ".repeat(item.depth);
    let marker = match (item.is_container, item.is_expanded) {
        (true, true) => "▾ ",
        (true, false) => "▸ ",
        (false, _) => "  ",
    };
    let suffix = if item.is_container { "/" } else { "" };
    let highlight = if item.highlighted_text.is_empty() {
        ""
    } else {
        " *"
    };
    format!("{indent}{marker}{}{suffix}{highlight}", item.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetree::tree::{CheckedStatus, NodeProps, TreeContext};

    fn item(name: &str, depth: usize, is_container: bool, is_expanded: bool) -> FlatItem {
        FlatItem {
            uri: format!("/r/{name}"),
            name: name.to_string(),
            depth,
            is_container,
            is_expanded,
            is_last_sibling: false,
            is_selected: false,
            checked_status: CheckedStatus::Clear,
            softened: false,
            highlighted_text: String::new(),
        }
    }

    #[test]
    fn render_row_marks_containers() {
        assert_eq!(render_row(&item("src", 1, true, true)), "  ▾ src/");
        assert_eq!(render_row(&item("doc", 0, true, false)), "▸ doc/");
        assert_eq!(render_row(&item("a.rs", 2, false, false)), "      a.rs");
    }

    #[test]
    fn render_row_flags_highlights() {
        let mut row = item("main.rs", 0, false, false);
        row.highlighted_text = "ma".into();
        assert_eq!(render_row(&row), "  main.rs *");
    }

    #[test]
    fn resolve_target_accepts_relative_uris() {
        let root = FileTreeNode::create(NodeProps::new("/r/", "/r/"), &TreeContext::shared())
            .unwrap();
        assert_eq!(resolve_target(&root, "/r/A/"), "/r/A/");
        assert_eq!(resolve_target(&root, "A/B/"), "/r/A/B/");
        assert_eq!(resolve_target(&root, "/A/"), "/r/A/");
    }

    #[test]
    fn describe_reports_missing_nodes() {
        assert_eq!(describe(None), "not found");
    }

    #[test]
    fn cli_overrides_only_given_flags() {
        let cli = Cli::parse_from(["ftree", "--depth", "3", "--fuzzy", "--filter", "ma"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.tree.max_depth, Some(3));
        assert_eq!(overrides.filter.mode.as_deref(), Some("fuzzy"));
        assert_eq!(overrides.filter.text.as_deref(), Some("ma"));
        assert!(overrides.general.show_hidden.is_none());
        assert!(overrides.working_set.uris.is_none());
    }
}
