//! Uri shape helpers.
//!
//! Uris are `/`-separated. A trailing separator marks a container. A uri may
//! carry a remote prefix of the form `scheme://authority`, which only
//! `local_path` strips.

/// Path separator used by every uri.
pub const SEPARATOR: char = '/';

const REMOTE_MARKER: &str = "://";

/// Whether `uri` denotes a container (ends with the separator).
pub fn is_directory(uri: &str) -> bool {
    uri.ends_with(SEPARATOR)
}

/// Strip a single trailing separator, keeping a bare `/` intact.
pub fn trim_trailing_separator(uri: &str) -> &str {
    if uri.len() > 1 {
        uri.strip_suffix(SEPARATOR).unwrap_or(uri)
    } else {
        uri
    }
}

/// Append the separator if it is missing.
pub fn ensure_trailing_separator(uri: &str) -> String {
    if is_directory(uri) {
        uri.to_string()
    } else {
        format!("{uri}{SEPARATOR}")
    }
}

/// Final path segment, ignoring a trailing separator.
pub fn basename(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// `uri` relative to `root`, without a trailing separator.
///
/// Returns the trimmed uri unchanged when it does not live under `root`.
pub fn relative<'a>(root: &str, uri: &'a str) -> &'a str {
    let rest = uri.strip_prefix(root).unwrap_or(uri);
    rest.trim_end_matches(SEPARATOR)
}

/// Filesystem-style path of `uri`: the path part of a remote uri, otherwise
/// the uri itself.
pub fn local_path(uri: &str) -> &str {
    match uri.find(REMOTE_MARKER) {
        Some(idx) => {
            let after = &uri[idx + REMOTE_MARKER.len()..];
            match after.find(SEPARATOR) {
                Some(path_start) => &after[path_start..],
                None => "/",
            }
        }
        None => uri,
    }
}

/// Non-empty segments of a uri fragment.
pub fn segments(sub: &str) -> impl Iterator<Item = &str> {
    sub.split(SEPARATOR).filter(|part| !part.is_empty())
}

/// Uri of the entry `name` directly under the container `dir_uri`.
pub fn join(dir_uri: &str, name: &str, is_dir: bool) -> String {
    let mut joined = ensure_trailing_separator(dir_uri);
    joined.push_str(name);
    if is_dir {
        joined.push(SEPARATOR);
    }
    joined
}

/// Whether `uri` equals `ancestor` or lies beneath it.
///
/// `ancestor` is treated as a container whether or not it carries the
/// trailing separator.
pub fn is_within(ancestor: &str, uri: &str) -> bool {
    let base = trim_trailing_separator(ancestor);
    if trim_trailing_separator(uri) == base {
        return true;
    }
    let prefix = ensure_trailing_separator(base);
    uri.starts_with(&prefix)
}
