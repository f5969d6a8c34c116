//! Semantic graph data structures

mod node;
mod tree;

pub use node::{AttrKey, NodeId, NodeKind, SemanticNode};
pub use tree::{GraphError, GraphResult, SemanticGraph};
