//! Configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--filter`, `--depth`, etc.)
//! 2. `$FTREE_CONFIG` environment variable (path to config file)
//! 3. Project-local `.ftree.toml` in the current working directory
//! 4. Global `~/.config/ftree/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::error::Result;
use crate::fs::{LoadOptions, SortBy};
use crate::tree::{FilterMode, TreeContext, WorkingSet};

// ── Section configs ──────────────────────────────────────────────────────────

/// General settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Starting directory (overridden by CLI positional arg).
    pub default_path: Option<String>,
    /// Show dot-files.
    pub show_hidden: Option<bool>,
}

/// Tree loading and visibility settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Sort order: "name", "size", "modified".
    pub sort_by: Option<String>,
    /// Directories always listed first.
    pub dirs_first: Option<bool>,
    /// Directory levels read eagerly.
    pub max_depth: Option<usize>,
    /// Glob patterns matched against entry names.
    pub ignored_names: Option<Vec<String>>,
    /// Hide entries matching `ignored_names`.
    pub hide_ignored_names: Option<bool>,
}

/// Filter settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    pub text: Option<String>,
    /// "substring" or "fuzzy".
    pub mode: Option<String>,
}

/// Working set settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WorkingSetConfig {
    pub uris: Option<Vec<String>>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive, e.g. "debug" or "filetree=trace".
    pub level: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub filter: FilterConfig,
    pub working_set: WorkingSetConfig,
    pub logging: LoggingConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default number of directory levels read eagerly.
pub const DEFAULT_MAX_DEPTH: usize = 1;
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("FTREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".ftree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("ftree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: other
                    .general
                    .default_path
                    .clone()
                    .or(self.general.default_path),
                show_hidden: other.general.show_hidden.or(self.general.show_hidden),
            },
            tree: TreeConfig {
                sort_by: other.tree.sort_by.clone().or(self.tree.sort_by),
                dirs_first: other.tree.dirs_first.or(self.tree.dirs_first),
                max_depth: other.tree.max_depth.or(self.tree.max_depth),
                ignored_names: other
                    .tree
                    .ignored_names
                    .clone()
                    .or(self.tree.ignored_names),
                hide_ignored_names: other
                    .tree
                    .hide_ignored_names
                    .or(self.tree.hide_ignored_names),
            },
            filter: FilterConfig {
                text: other.filter.text.clone().or(self.filter.text),
                mode: other.filter.mode.clone().or(self.filter.mode),
            },
            working_set: WorkingSetConfig {
                uris: other
                    .working_set
                    .uris
                    .clone()
                    .or(self.working_set.uris),
            },
            logging: LoggingConfig {
                level: other.logging.level.clone().or(self.logging.level),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn default_path(&self) -> &str {
        self.general.default_path.as_deref().unwrap_or(".")
    }

    pub fn show_hidden(&self) -> bool {
        self.general.show_hidden.unwrap_or(false)
    }

    /// Sort mode: "name", "size", or "modified".
    pub fn sort_by(&self) -> &str {
        self.tree.sort_by.as_deref().unwrap_or("name")
    }

    pub fn dirs_first(&self) -> bool {
        self.tree.dirs_first.unwrap_or(true)
    }

    pub fn max_depth(&self) -> usize {
        self.tree.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn ignored_names(&self) -> &[String] {
        self.tree.ignored_names.as_deref().unwrap_or(&[])
    }

    pub fn hide_ignored_names(&self) -> bool {
        self.tree.hide_ignored_names.unwrap_or(true)
    }

    pub fn filter_text(&self) -> &str {
        self.filter.text.as_deref().unwrap_or("")
    }

    pub fn filter_mode(&self) -> FilterMode {
        FilterMode::from_str(self.filter.mode.as_deref().unwrap_or("substring"))
    }

    pub fn working_set(&self) -> &[String] {
        self.working_set.uris.as_deref().unwrap_or(&[])
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Loader options derived from the `[tree]` section.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            max_depth: self.max_depth(),
            sort_by: SortBy::from_str(self.sort_by()),
            dirs_first: self.dirs_first(),
        }
    }

    /// Tree context derived from the filter, working set and visibility settings.
    pub fn tree_context(&self) -> Result<Arc<TreeContext>> {
        TreeContext::builder()
            .filter(self.filter_text())
            .filter_mode(self.filter_mode())
            .working_set(WorkingSet::new(self.working_set().iter().cloned()))
            .show_hidden(self.show_hidden())
            .ignored_names(self.ignored_names().iter().cloned(), self.hide_ignored_names())
            .build()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.default_path(), ".");
        assert!(!cfg.show_hidden());
        assert_eq!(cfg.sort_by(), "name");
        assert!(cfg.dirs_first());
        assert_eq!(cfg.max_depth(), 1);
        assert!(cfg.ignored_names().is_empty());
        assert!(cfg.hide_ignored_names());
        assert_eq!(cfg.filter_text(), "");
        assert_eq!(cfg.filter_mode(), FilterMode::Substring);
        assert!(cfg.working_set().is_empty());
        assert_eq!(cfg.log_level(), "warn");
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[general]
default_path = "/srv"
show_hidden = true

[tree]
sort_by = "size"
dirs_first = false
max_depth = 3
ignored_names = ["*.o", "target"]
hide_ignored_names = false

[filter]
text = "main"
mode = "fuzzy"

[working_set]
uris = ["/srv/src/"]

[logging]
level = "debug"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.default_path(), "/srv");
        assert!(cfg.show_hidden());
        assert_eq!(cfg.sort_by(), "size");
        assert!(!cfg.dirs_first());
        assert_eq!(cfg.max_depth(), 3);
        assert_eq!(cfg.ignored_names(), ["*.o", "target"]);
        assert!(!cfg.hide_ignored_names());
        assert_eq!(cfg.filter_text(), "main");
        assert_eq!(cfg.filter_mode(), FilterMode::Fuzzy);
        assert_eq!(cfg.working_set(), ["/srv/src/"]);
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml = r#"
[tree]
max_depth = 2
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.max_depth(), 2);
        // Everything else should be defaults
        assert_eq!(cfg.sort_by(), "name");
        assert!(!cfg.show_hidden());
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            general: GeneralConfig {
                show_hidden: Some(false),
                ..Default::default()
            },
            tree: TreeConfig {
                max_depth: Some(2),
                sort_by: Some("size".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let over = AppConfig {
            general: GeneralConfig {
                show_hidden: Some(true),
                ..Default::default()
            },
            tree: TreeConfig {
                max_depth: Some(4),
                // sort_by not set, keeps base
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert!(merged.show_hidden()); // overridden
        assert_eq!(merged.max_depth(), 4); // overridden
        assert_eq!(merged.sort_by(), "size"); // from base
    }

    #[test]
    fn test_merge_none_does_not_clear_some() {
        let base = AppConfig {
            filter: FilterConfig {
                text: Some("lib".into()),
                mode: Some("fuzzy".into()),
            },
            ..Default::default()
        };
        let merged = base.merge(&AppConfig::default());
        assert_eq!(merged.filter_text(), "lib");
        assert_eq!(merged.filter_mode(), FilterMode::Fuzzy);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[general]
show_hidden = true

[tree]
sort_by = "modified"
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert!(cfg.show_hidden());
        assert_eq!(cfg.sort_by(), "modified");
        assert_eq!(cfg.max_depth(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[general]
show_hidden = true

[tree]
max_depth = 2
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            tree: TreeConfig {
                max_depth: Some(5),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        // CLI override wins
        assert_eq!(cfg.max_depth(), 5);
        // File value preserved (not overridden by CLI)
        assert!(cfg.show_hidden());
    }

    #[test]
    fn test_load_options_and_context() {
        let cfg: AppConfig = toml::from_str(
            r#"
[tree]
sort_by = "size"
max_depth = 2
ignored_names = ["*.o"]

[filter]
text = "ma"
"#,
        )
        .expect("parse");
        let options = cfg.load_options();
        assert_eq!(options.sort_by, SortBy::Size);
        assert_eq!(options.max_depth, 2);
        assert!(options.dirs_first);

        let ctx = cfg.tree_context().expect("context");
        assert_eq!(ctx.filter(), "ma");
        assert!(ctx.hide_ignored_names);
        assert!(ctx.is_ignored("x.o"));
    }

    #[test]
    fn test_invalid_ignored_pattern_fails_context() {
        let cfg = AppConfig {
            tree: TreeConfig {
                ignored_names: Some(vec!["a[".into()]),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(cfg.tree_context().is_err());
    }
}
