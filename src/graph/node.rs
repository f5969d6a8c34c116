//! Node representation in the semantic graph

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a NodeId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural classification of a node within the sentence tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name")]
pub enum NodeKind {
    /// Top-level sentence
    Sentence,
    /// Clause inside a sentence
    SubSentence,
    /// Entity mention
    Entity,
    /// Plain word token
    Word,
    /// Any node kind the kernel emits that we do not interpret
    Other(String),
}

/// The closed set of attribute keys the engine interprets.
///
/// Graphs may carry arbitrary attribute keys; everything outside this set
/// is preserved on the node but never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKey {
    /// Semantic type of an entity, parsed into `analysis::EntityType`
    Type,
    /// Canonical full name of an entity
    FullName,
    /// Surface text of the node
    Value,
    /// Syntactic role token of an entity
    Role,
    /// Coreference chain marker written by a resolver
    CorefGroup,
}

impl AttrKey {
    /// Attribute key as stored in the graph
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKey::Type => "Type",
            AttrKey::FullName => "FullName",
            AttrKey::Value => "Value",
            AttrKey::Role => "Role",
            AttrKey::CorefGroup => "CorefGroup",
        }
    }
}

/// A node in the semantic graph
///
/// Nodes form an ordered tree (`Sentence` → `SubSentence` → `Entity`/`Word`)
/// and carry string attributes. The tree is built once by a kernel and is
/// immutable for the rest of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticNode {
    /// Unique identifier
    pub id: NodeId,
    /// Structural kind
    pub kind: NodeKind,
    /// Named attributes; unknown keys are preserved but not interpreted
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Ordered children
    #[serde(default)]
    pub children: Vec<SemanticNode>,
}

impl SemanticNode {
    /// Create a new node of the given kind
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set a recognized attribute
    pub fn with_attr(mut self, key: AttrKey, value: impl Into<String>) -> Self {
        self.attrs.insert(key.as_str().to_string(), value.into());
        self
    }

    /// Set an arbitrary attribute key
    pub fn with_raw_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: SemanticNode) -> Self {
        self.children.push(child);
        self
    }

    /// Look up a recognized attribute
    pub fn attr(&self, key: AttrKey) -> Option<&str> {
        self.attrs.get(key.as_str()).map(String::as_str)
    }

    /// Display name of an entity: `FullName` if non-empty, else `Value`
    pub fn display_name(&self) -> Option<&str> {
        match self.attr(AttrKey::FullName) {
            Some(name) if !name.is_empty() => Some(name),
            _ => self.attr(AttrKey::Value),
        }
    }

    /// Whether this node is an entity mention
    pub fn is_entity(&self) -> bool {
        self.kind == NodeKind::Entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let node = SemanticNode::new(NodeKind::Entity)
            .with_attr(AttrKey::FullName, "Иван Петров")
            .with_attr(AttrKey::Value, "Иван");
        assert_eq!(node.display_name(), Some("Иван Петров"));
    }

    #[test]
    fn test_display_name_falls_back_to_value() {
        let node = SemanticNode::new(NodeKind::Entity)
            .with_attr(AttrKey::FullName, "")
            .with_attr(AttrKey::Value, "Иван");
        assert_eq!(node.display_name(), Some("Иван"));
    }

    #[test]
    fn test_unknown_attrs_are_preserved() {
        let node = SemanticNode::new(NodeKind::Entity).with_raw_attr("Lemma", "ivan");
        assert_eq!(node.attrs.get("Lemma").map(String::as_str), Some("ivan"));
        assert_eq!(node.attr(AttrKey::Type), None);
    }
}
