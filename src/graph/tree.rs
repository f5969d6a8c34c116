//! The semantic graph: an ordered tree of sentence/entity nodes
//!
//! A graph is produced once per request by a kernel, is immutable for the
//! remainder of the pipeline, and is owned exclusively by the request that
//! created it. The canonical textual form is the serde_json rendering of
//! the tree; `parse` is its inverse.

use super::node::{NodeKind, SemanticNode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when reading or writing a graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed graph text: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// An ordered tree of semantic nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticGraph {
    /// Top-level nodes, normally sentences, in document order
    pub roots: Vec<SemanticNode>,
}

impl SemanticGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level node
    pub fn with_root(mut self, node: SemanticNode) -> Self {
        self.roots.push(node);
        self
    }

    /// Parse a graph from its canonical textual form
    pub fn parse(text: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the graph to its canonical textual form
    pub fn to_canonical_string(&self) -> String {
        // Infallible: the tree contains only string maps and vecs
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// All nodes in pre-order
    pub fn descendants(&self) -> Vec<&SemanticNode> {
        let mut out = Vec::new();
        for root in &self.roots {
            collect(root, &mut out);
        }
        out
    }

    /// Entity nodes that are candidates for theme aggregation.
    ///
    /// With `all_subthemes` every entity in the tree qualifies. Otherwise
    /// only entities whose parent is a sub-sentence directly under a
    /// top-level sentence are returned, excluding nested sub-themes.
    pub fn themed_entities(&self, all_subthemes: bool) -> Vec<&SemanticNode> {
        let mut out = Vec::new();
        if all_subthemes {
            for node in self.descendants() {
                if node.is_entity() {
                    out.push(node);
                }
            }
        } else {
            for root in &self.roots {
                if root.kind != NodeKind::Sentence {
                    continue;
                }
                for clause in &root.children {
                    if clause.kind != NodeKind::SubSentence {
                        continue;
                    }
                    for child in &clause.children {
                        if child.is_entity() {
                            out.push(child);
                        }
                    }
                }
            }
        }
        out
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.descendants().len()
    }

    /// Whether the graph has no nodes at all
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn collect<'a>(node: &'a SemanticNode, out: &mut Vec<&'a SemanticNode>) {
    out.push(node);
    for child in &node.children {
        collect(child, out);
    }
}
