//! Read-only, cross-cutting state consulted by derived node properties.
//!
//! A `TreeContext` is shared by `Arc` across every node of a tree. Nodes
//! never mutate it; changing the filter or working set means building a
//! new context and rebuilding the tree against it (`FileTreeNode::with_context`).

use std::fmt;
use std::sync::Arc;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::uri;

/// How filter text is matched against node names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Case-insensitive substring match.
    #[default]
    Substring,
    /// Case-insensitive subsequence match, skim style.
    Fuzzy,
}

impl FilterMode {
    /// Parse filter mode from config string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "fuzzy" => FilterMode::Fuzzy,
            _ => FilterMode::Substring,
        }
    }
}

/// A set of uris scoping which entries of a tree are of interest.
///
/// Members ending in the separator cover everything beneath them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSet {
    uris: Vec<String>,
}

impl WorkingSet {
    pub fn new<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uris: uris.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    /// Whether `uri` itself is covered: listed directly or under a listed container.
    pub fn contains_file(&self, uri: &str) -> bool {
        self.uris.iter().any(|member| {
            if uri::is_directory(member) {
                uri::is_within(member, uri)
            } else {
                member == uri
            }
        })
    }

    /// Whether the container `uri` holds any covered entry, or is itself covered.
    pub fn contains_dir(&self, uri: &str) -> bool {
        self.uris.iter().any(|member| {
            uri::is_within(uri, member) || (uri::is_directory(member) && uri::is_within(member, uri))
        })
    }
}

/// Filter text compiled once per context: the lowercased needle and, in
/// fuzzy mode, the matcher.
#[derive(Clone, Default)]
struct NameFilter {
    text: String,
    needle: String,
    mode: FilterMode,
    fuzzy: Option<Arc<SkimMatcherV2>>,
}

impl NameFilter {
    fn new(text: String, mode: FilterMode) -> Self {
        let fuzzy = match mode {
            FilterMode::Fuzzy => Some(Arc::new(SkimMatcherV2::default().ignore_case())),
            FilterMode::Substring => None,
        };
        Self {
            needle: text.to_lowercase(),
            text,
            mode,
            fuzzy,
        }
    }

    fn matches(&self, name: &str) -> bool {
        if self.text.is_empty() {
            return true;
        }
        match &self.fuzzy {
            Some(matcher) => matcher.fuzzy_match(name, &self.text).is_some(),
            None => name.to_lowercase().contains(&self.needle),
        }
    }
}

impl fmt::Debug for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameFilter")
            .field("text", &self.text)
            .field("mode", &self.mode)
            .finish()
    }
}

/// External state needed to compute filter and selection dependent properties.
#[derive(Debug, Clone)]
pub struct TreeContext {
    /// Active working set; empty means everything is in scope.
    pub working_set: WorkingSet,
    /// Working set being edited, if the tree is in edit mode.
    pub editing: Option<WorkingSet>,
    /// Show dot-files.
    pub show_hidden: bool,
    /// Hide entries whose name matches `ignored_patterns`.
    pub hide_ignored_names: bool,
    /// Current working root uri.
    pub cwd: Option<String>,
    filter: NameFilter,
    ignored_patterns: Vec<String>,
    ignored_names: GlobSet,
}

impl Default for TreeContext {
    fn default() -> Self {
        Self {
            working_set: WorkingSet::default(),
            editing: None,
            show_hidden: false,
            hide_ignored_names: false,
            cwd: None,
            filter: NameFilter::default(),
            ignored_patterns: Vec::new(),
            ignored_names: GlobSet::empty(),
        }
    }
}

impl TreeContext {
    pub fn builder() -> TreeContextBuilder {
        TreeContextBuilder::default()
    }

    /// A default context, ready to share.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ignored_patterns(&self) -> &[String] {
        &self.ignored_patterns
    }

    /// Whether `name` matches one of the ignored-name globs.
    pub fn is_ignored(&self, name: &str) -> bool {
        !self.ignored_patterns.is_empty() && self.ignored_names.is_match(name)
    }

    /// Active filter text; empty means no filter.
    pub fn filter(&self) -> &str {
        &self.filter.text
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter.mode
    }

    pub fn has_filter(&self) -> bool {
        !self.filter.text.is_empty()
    }

    /// Whether `name` passes the active filter. An empty filter passes everything.
    pub fn name_matches(&self, name: &str) -> bool {
        self.filter.matches(name)
    }

    /// Copy of this context with a different filter text.
    pub fn with_filter(&self, filter: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            filter: NameFilter::new(filter.into(), self.filter.mode),
            ..self.clone()
        })
    }

    /// Copy of this context in (or out of) working-set edit mode.
    pub fn with_editing(&self, editing: Option<WorkingSet>) -> Arc<Self> {
        Arc::new(Self {
            editing,
            ..self.clone()
        })
    }
}

/// Builder for [`TreeContext`]; compiles ignored-name globs on `build`.
#[derive(Debug, Default)]
pub struct TreeContextBuilder {
    context: TreeContext,
    filter: String,
    filter_mode: FilterMode,
}

impl TreeContextBuilder {
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn working_set(mut self, working_set: WorkingSet) -> Self {
        self.context.working_set = working_set;
        self
    }

    pub fn editing(mut self, editing: WorkingSet) -> Self {
        self.context.editing = Some(editing);
        self
    }

    pub fn show_hidden(mut self, show: bool) -> Self {
        self.context.show_hidden = show;
        self
    }

    pub fn ignored_names<I, S>(mut self, patterns: I, hide: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.ignored_patterns = patterns.into_iter().map(Into::into).collect();
        self.context.hide_ignored_names = hide;
        self
    }

    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.context.cwd = Some(cwd.into());
        self
    }

    pub fn build(self) -> Result<Arc<TreeContext>> {
        let mut context = self.context;
        context.filter = NameFilter::new(self.filter, self.filter_mode);
        let mut builder = GlobSetBuilder::new();
        for pattern in &context.ignored_patterns {
            builder.add(Glob::new(pattern)?);
        }
        context.ignored_names = builder.build()?;
        Ok(Arc::new(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let ctx = TreeContext::default();
        assert!(ctx.name_matches("anything"));
        assert!(!ctx.has_filter());
    }

    #[test]
    fn substring_filter_is_case_insensitive() {
        let ctx = TreeContext::builder().filter("READ").build().unwrap();
        assert!(ctx.name_matches("readme.md"));
        assert!(!ctx.name_matches("main.rs"));
    }

    #[test]
    fn fuzzy_filter_matches_subsequence() {
        let ctx = TreeContext::builder()
            .filter("mnrs")
            .filter_mode(FilterMode::Fuzzy)
            .build()
            .unwrap();
        assert!(ctx.name_matches("main.rs"));
        assert!(!ctx.name_matches("lib.rs"));
    }

    #[test]
    fn with_filter_recompiles_and_keeps_mode() {
        let ctx = TreeContext::builder()
            .filter("zz")
            .filter_mode(FilterMode::Fuzzy)
            .build()
            .unwrap();
        assert!(!ctx.name_matches("main.rs"));

        let refiltered = ctx.with_filter("MNRS");
        assert_eq!(refiltered.filter_mode(), FilterMode::Fuzzy);
        assert!(refiltered.name_matches("main.rs"));

        let substring = TreeContext::builder().filter("Main").build().unwrap();
        assert!(substring.name_matches("MAIN.rs"));
        assert!(!substring.with_filter("lib").name_matches("main.rs"));
    }

    #[test]
    fn ignored_names_use_globs() {
        let ctx = TreeContext::builder()
            .ignored_names(["*.o", ".git"], true)
            .build()
            .unwrap();
        assert!(ctx.is_ignored("main.o"));
        assert!(ctx.is_ignored(".git"));
        assert!(!ctx.is_ignored("main.rs"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let result = TreeContext::builder().ignored_names(["a["], true).build();
        assert!(result.is_err());
    }

    #[test]
    fn working_set_contains_file() {
        let ws = WorkingSet::new(["/r/A/", "/r/b.txt"]);
        assert!(ws.contains_file("/r/A/x.rs"));
        assert!(ws.contains_file("/r/A/"));
        assert!(ws.contains_file("/r/b.txt"));
        assert!(!ws.contains_file("/r/c.txt"));
    }

    #[test]
    fn working_set_contains_dir() {
        let ws = WorkingSet::new(["/r/A/B/c.txt"]);
        assert!(ws.contains_dir("/r/"));
        assert!(ws.contains_dir("/r/A/"));
        assert!(!ws.contains_dir("/r/C/"));

        let ws = WorkingSet::new(["/r/A/"]);
        assert!(ws.contains_dir("/r/A/B/"));
    }

    #[test]
    fn filter_mode_from_str() {
        assert_eq!(FilterMode::from_str("fuzzy"), FilterMode::Fuzzy);
        assert_eq!(FilterMode::from_str("other"), FilterMode::Substring);
    }

    #[test]
    fn with_filter_keeps_other_fields() {
        let ctx = TreeContext::builder().show_hidden(true).build().unwrap();
        let filtered = ctx.with_filter("x");
        assert_eq!(filtered.filter(), "x");
        assert!(filtered.show_hidden);
    }

    #[test]
    fn with_editing_toggles_edit_mode() {
        let ctx = TreeContext::builder()
            .ignored_names(["*.o"], false)
            .build()
            .unwrap();
        let editing = ctx.with_editing(Some(WorkingSet::new(["/r/A/"])));
        assert!(editing.editing.is_some());
        assert_eq!(editing.ignored_patterns(), ["*.o".to_string()]);
        assert!(editing.is_ignored("x.o"));
        assert!(editing.with_editing(None).editing.is_none());
    }
}
