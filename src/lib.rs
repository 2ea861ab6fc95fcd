//! Immutable, path-addressed file trees.
//!
//! [`tree::FileTreeNode`] is the core: a persistent node whose updates share
//! unchanged subtrees and return the very same `Arc` when nothing changed.
//! [`fs`] builds such trees from a real directory.

pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod tree;

pub use error::{Result, TreeError};
