//! Seams to the external linguistic collaborators
//!
//! The engine never parses, lemmatizes, or resolves references itself; it
//! consumes a [`LanguageKernel`], an optional [`CoreferenceResolver`], and
//! optional secondary analyses through the traits below. A deterministic
//! reference kernel for demos and tests lives in [`markup`].

mod markup;

pub use markup::MarkupKernel;

use crate::analysis::{OpinionMiningResult, TonalityResult};
use crate::graph::{GraphError, NodeId, SemanticGraph, SemanticNode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors surfaced by external collaborators
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// The collaborator failed outright
    #[error("kernel failure: {0}")]
    Failure(String),

    /// Supplied graph text did not parse
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Entity selection mode passed through to the kernel, uninterpreted here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectEntitiesMode {
    /// Full entity inventory
    #[default]
    Full,
    /// Named entities only
    Named,
}

/// How secondary analyses allocate statements to objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectAllocateMethod {
    /// First entity mention, pronouns included
    #[default]
    FirstEntityWithTypePronoun,
    /// First entity mention, pronouns excluded
    FirstEntity,
}

/// Caller-supplied parameters for tonality marking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TonalityParams {
    /// Optional inquiry restricting which objects are scored
    pub inquiry: Option<String>,
}

/// One theme tuple of a kernel-built semantic network.
///
/// The type arrives as a raw string; the aggregator validates it against
/// the closed enumeration exactly like a raw mention.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeTuple {
    pub id: usize,
    pub name: String,
    pub original_name: Option<String>,
    pub type_name: String,
    pub freq_adj: u32,
    pub freq_subj: u32,
    pub freq_obj: u32,
    pub freq_other: u32,
}

/// One link tuple of a kernel-built semantic network
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTuple {
    pub source_theme_id: usize,
    pub dest_theme_id: usize,
    pub link_type: String,
    pub freq: u32,
}

/// Pre-computed theme/link pair set returned by the kernel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticNetwork {
    pub themes: Vec<ThemeTuple>,
    pub links: Vec<LinkTuple>,
}

/// Coreference chains over graph nodes, produced externally
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreferenceInfo {
    /// Each chain lists the nodes that co-refer, in document order
    pub chains: Vec<Vec<NodeId>>,
}

impl CoreferenceInfo {
    /// Whether no chains were found
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Number of chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }
}

/// The linguistic kernel boundary.
///
/// One kernel-controller instance is wrapped by each pool worker; the
/// kernel is not safe for concurrent use, so callers reach it only
/// through a checked-out worker.
#[async_trait]
pub trait LanguageKernel: Send + Sync {
    /// Parse raw text into a semantic graph
    async fn text_to_graph(
        &self,
        text: &str,
        after_spell_checking: bool,
        base_date: DateTime<Utc>,
        mode: SelectEntitiesMode,
    ) -> Result<SemanticGraph, KernelError>;

    /// Reconstruct a graph from its canonical textual form
    fn parse_graph(&self, text: &str) -> Result<SemanticGraph, KernelError> {
        Ok(SemanticGraph::parse(text)?)
    }

    /// Build the pre-computed theme/link network for the graph
    async fn build_semantic_network(
        &self,
        graph: &SemanticGraph,
        coreference: Option<&CoreferenceInfo>,
        include_all_subthemes: bool,
    ) -> Result<SemanticNetwork, KernelError>;

    /// Whether the kernel classifies this entity node as theme-eligible
    fn is_theme_eligible(&self, node: &SemanticNode) -> bool;

    /// All inflected forms of a word
    async fn word_forms(&self, word: &str) -> Result<Vec<String>, KernelError>;

    /// All inflected forms paired with their part-of-speech tags
    async fn word_forms_with_pos(
        &self,
        word: &str,
    ) -> Result<(Vec<String>, Vec<String>), KernelError>;

    /// Normal (dictionary) form of a word, if the kernel knows one
    async fn normal_form(&self, word: &str) -> Result<Option<String>, KernelError>;

    /// All candidate normal forms of a word
    async fn all_normal_forms(&self, word: &str) -> Result<Vec<String>, KernelError>;
}

/// The coreference resolver boundary
pub trait CoreferenceResolver: Send + Sync {
    /// Resolve coreference chains over a freshly built graph
    fn resolve(&self, graph: &SemanticGraph) -> Result<CoreferenceInfo, KernelError>;

    /// Re-read chains already annotated in a previously serialized graph
    fn read_from_graph(&self, graph: &SemanticGraph) -> Result<CoreferenceInfo, KernelError>;
}

/// Opinion mining secondary analysis boundary
#[async_trait]
pub trait OpinionMiner: Send + Sync {
    async fn run(
        &self,
        graph: &SemanticGraph,
        coreference: Option<&CoreferenceInfo>,
        allocate_method: ObjectAllocateMethod,
    ) -> Result<OpinionMiningResult, KernelError>;
}

/// Tonality marking secondary analysis boundary
#[async_trait]
pub trait TonalityMarker: Send + Sync {
    async fn run(
        &self,
        graph: &SemanticGraph,
        coreference: Option<&CoreferenceInfo>,
        allocate_method: ObjectAllocateMethod,
        params: &TonalityParams,
    ) -> Result<TonalityResult, KernelError>;
}

/// Coreference resolver that reads `CorefGroup` markers from the graph.
///
/// Entities sharing a `CorefGroup` attribute value form one chain. Both
/// trait methods read the same markers, so a graph that already carries
/// them round-trips through serialization without losing chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttrCoreference;

impl AttrCoreference {
    pub fn new() -> Self {
        Self
    }

    fn chains_from(&self, graph: &SemanticGraph) -> CoreferenceInfo {
        use std::collections::HashMap;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut chains: Vec<Vec<NodeId>> = Vec::new();
        for node in graph.descendants() {
            let Some(group) = node.attr(crate::graph::AttrKey::CorefGroup) else {
                continue;
            };
            let idx = match index.get(group) {
                Some(&idx) => idx,
                None => {
                    let idx = chains.len();
                    index.insert(group.to_string(), idx);
                    chains.push(Vec::new());
                    idx
                }
            };
            chains[idx].push(node.id);
        }
        // Singleton groups are not chains
        chains.retain(|c| c.len() > 1);
        CoreferenceInfo { chains }
    }
}

impl CoreferenceResolver for AttrCoreference {
    fn resolve(&self, graph: &SemanticGraph) -> Result<CoreferenceInfo, KernelError> {
        Ok(self.chains_from(graph))
    }

    fn read_from_graph(&self, graph: &SemanticGraph) -> Result<CoreferenceInfo, KernelError> {
        Ok(self.chains_from(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttrKey, NodeKind, SemanticNode};

    #[test]
    fn test_attr_coreference_groups_by_marker() {
        let graph = SemanticGraph::new().with_root(
            SemanticNode::new(NodeKind::Sentence).with_child(
                SemanticNode::new(NodeKind::SubSentence)
                    .with_child(
                        SemanticNode::new(NodeKind::Entity).with_attr(AttrKey::CorefGroup, "g1"),
                    )
                    .with_child(
                        SemanticNode::new(NodeKind::Entity).with_attr(AttrKey::CorefGroup, "g1"),
                    )
                    .with_child(
                        SemanticNode::new(NodeKind::Entity).with_attr(AttrKey::CorefGroup, "g2"),
                    ),
            ),
        );

        let info = AttrCoreference::new().resolve(&graph).unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info.chains[0].len(), 2);
    }

    #[test]
    fn test_attr_coreference_survives_round_trip() {
        let graph = SemanticGraph::new().with_root(
            SemanticNode::new(NodeKind::Sentence).with_child(
                SemanticNode::new(NodeKind::SubSentence)
                    .with_child(
                        SemanticNode::new(NodeKind::Entity).with_attr(AttrKey::CorefGroup, "g"),
                    )
                    .with_child(
                        SemanticNode::new(NodeKind::Entity).with_attr(AttrKey::CorefGroup, "g"),
                    ),
            ),
        );

        let resolver = AttrCoreference::new();
        let fresh = resolver.resolve(&graph).unwrap();
        let reparsed = SemanticGraph::parse(&graph.to_canonical_string()).unwrap();
        let reread = resolver.read_from_graph(&reparsed).unwrap();
        assert_eq!(fresh, reread);
    }
}
