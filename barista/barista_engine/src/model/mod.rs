//! Result tree model.

pub mod node;
pub mod tree;

pub use node::{Counts, GeneratorKind, HookKind, Node, NodeKind, NodeState};
pub use tree::{ReportNode, ResultTree};
