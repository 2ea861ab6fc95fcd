pub mod loader;

pub use loader::{load_children, load_tree, LoadOptions, SortBy};
