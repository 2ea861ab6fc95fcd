use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised while building or updating file trees.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Node properties are missing a required field or break a tree invariant.
    #[error("Invalid node spec: {0}")]
    InvalidNodeSpec(String),

    /// Two sibling nodes derive the same name.
    #[error("Duplicate child name: {0}")]
    DuplicateChildName(String),

    /// An update targets a child that does not exist.
    #[error("Child not found: {name} in {parent}")]
    ChildNotFound { parent: String, name: String },

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An ignored-name glob failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    /// JSON output could not be produced.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TreeError = io_err.into();
        assert!(matches!(err, TreeError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn invalid_node_spec_display() {
        let err = TreeError::InvalidNodeSpec("uri is required".into());
        assert_eq!(err.to_string(), "Invalid node spec: uri is required");
    }

    #[test]
    fn child_not_found_display() {
        let err = TreeError::ChildNotFound {
            parent: "/r/A/".into(),
            name: "Z".into(),
        };
        assert_eq!(err.to_string(), "Child not found: Z in /r/A/");
    }

    #[test]
    fn pattern_error_conversion() {
        let glob_err = globset::Glob::new("a[").unwrap_err();
        let err: TreeError = glob_err.into();
        assert!(matches!(err, TreeError::InvalidPattern(_)));
    }
}
