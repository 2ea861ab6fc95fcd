pub mod children;
pub mod context;
pub mod flatten;
pub mod node;
pub mod uri;

pub use children::Children;
pub use context::{FilterMode, TreeContext, TreeContextBuilder, WorkingSet};
pub use flatten::{flatten, FlatItem};
pub use node::{CheckedStatus, FileTreeNode, NodeProps, NodeUpdate};
