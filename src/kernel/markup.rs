//! Deterministic reference kernel over inline entity markup
//!
//! `MarkupKernel` exists so the pipeline can run end-to-end without a real
//! linguistic kernel: the CLI and the integration tests are its consumers.
//! It does no morphology or disambiguation. Sentences split on `.`/`!`/`?`,
//! sub-sentences on `,`/`;`, and entities are declared inline:
//!
//! ```text
//! [[Иван|Person|Subj]] видел [[Волга|Geo|Obj]], потом [[Маша|Person]].
//! ```
//!
//! The optional third field is the role token; an optional fourth field
//! `aux` marks the entity as not theme-eligible.

use super::{
    CoreferenceInfo, KernelError, LanguageKernel, LinkTuple, SelectEntitiesMode, SemanticNetwork,
    ThemeTuple,
};
use crate::analysis::group_themes;
use crate::graph::{AttrKey, NodeKind, SemanticGraph, SemanticNode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const SENTENCE_BREAKS: [char; 3] = ['.', '!', '?'];
const CLAUSE_BREAKS: [char; 2] = [',', ';'];

/// Reference kernel reading entities from inline markup
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupKernel;

impl MarkupKernel {
    pub fn new() -> Self {
        Self
    }

    /// Gather theme ids mentioned anywhere under `node`, in document order
    fn collect_sentence_themes(
        &self,
        node: &SemanticNode,
        theme_index: &HashMap<(String, String), usize>,
        seen: &mut Vec<usize>,
    ) {
        if self.is_theme_eligible(node) {
            let name = node.display_name().unwrap_or("").to_uppercase();
            let type_name = node.attr(AttrKey::Type).unwrap_or("").to_string();
            if let Some(&id) = theme_index.get(&(name, type_name)) {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
        }
        for child in &node.children {
            self.collect_sentence_themes(child, theme_index, seen);
        }
    }

    fn parse_clause(&self, text: &str) -> SemanticNode {
        let mut clause = SemanticNode::new(NodeKind::SubSentence);
        let mut rest = text;
        while let Some(start) = rest.find("[[") {
            let head = &rest[..start];
            for word in head.split_whitespace() {
                clause = clause.with_child(word_node(word));
            }
            let Some(end) = rest[start..].find("]]") else {
                // Unterminated marker: treat the remainder as plain words
                rest = &rest[start + 2..];
                continue;
            };
            let body = &rest[start + 2..start + end];
            clause = clause.with_child(entity_node(body));
            rest = &rest[start + end + 2..];
        }
        for word in rest.split_whitespace() {
            clause = clause.with_child(word_node(word));
        }
        clause
    }
}

fn word_node(word: &str) -> SemanticNode {
    SemanticNode::new(NodeKind::Word).with_attr(AttrKey::Value, word)
}

fn entity_node(body: &str) -> SemanticNode {
    let mut fields = body.split('|');
    let name = fields.next().unwrap_or("").trim();
    let entity_type = fields.next().unwrap_or("").trim();
    let role = fields.next().unwrap_or("").trim();
    let flags = fields.next().unwrap_or("").trim();

    let mut node = SemanticNode::new(NodeKind::Entity)
        .with_attr(AttrKey::Value, name)
        .with_attr(AttrKey::Type, entity_type);
    if !role.is_empty() {
        node = node.with_attr(AttrKey::Role, role);
    }
    if flags == "aux" {
        node = node.with_raw_attr("Aux", "1");
    }
    node
}

#[async_trait]
impl LanguageKernel for MarkupKernel {
    async fn text_to_graph(
        &self,
        text: &str,
        _after_spell_checking: bool,
        _base_date: DateTime<Utc>,
        _mode: SelectEntitiesMode,
    ) -> Result<SemanticGraph, KernelError> {
        let mut graph = SemanticGraph::new();
        for sentence_text in text.split(&SENTENCE_BREAKS[..]) {
            if sentence_text.trim().is_empty() {
                continue;
            }
            let mut sentence = SemanticNode::new(NodeKind::Sentence);
            for clause_text in sentence_text.split(&CLAUSE_BREAKS[..]) {
                if clause_text.trim().is_empty() {
                    continue;
                }
                sentence = sentence.with_child(self.parse_clause(clause_text));
            }
            graph.roots.push(sentence);
        }
        Ok(graph)
    }

    /// Themes via the shared grouping rules; links from per-sentence theme
    /// co-occurrence, ordered pairs counted by frequency.
    async fn build_semantic_network(
        &self,
        graph: &SemanticGraph,
        _coreference: Option<&CoreferenceInfo>,
        include_all_subthemes: bool,
    ) -> Result<SemanticNetwork, KernelError> {
        let themes = group_themes(graph, include_all_subthemes, |n| self.is_theme_eligible(n))
            .map_err(|e| KernelError::Failure(e.to_string()))?;

        let theme_index: HashMap<(String, String), usize> = themes
            .iter()
            .map(|t| ((t.name.to_uppercase(), t.entity_type.as_str().to_string()), t.id))
            .collect();

        let mut pair_order: Vec<(usize, usize)> = Vec::new();
        let mut pair_freq: HashMap<(usize, usize), u32> = HashMap::new();
        for sentence in &graph.roots {
            let mut seen: Vec<usize> = Vec::new();
            self.collect_sentence_themes(sentence, &theme_index, &mut seen);
            for (i, &src) in seen.iter().enumerate() {
                for &dst in &seen[i + 1..] {
                    let count = pair_freq.entry((src, dst)).or_insert_with(|| {
                        pair_order.push((src, dst));
                        0
                    });
                    *count += 1;
                }
            }
        }

        let links = pair_order
            .iter()
            .map(|&(src, dst)| LinkTuple {
                source_theme_id: src,
                dest_theme_id: dst,
                link_type: "related_to".to_string(),
                freq: pair_freq[&(src, dst)],
            })
            .collect();

        let themes = themes
            .into_iter()
            .map(|t| ThemeTuple {
                id: t.id,
                original_name: Some(t.name.to_uppercase()),
                type_name: t.entity_type.as_str().to_string(),
                name: t.name,
                freq_adj: t.freq_adj,
                freq_subj: t.freq_subj,
                freq_obj: t.freq_obj,
                freq_other: t.freq_other,
            })
            .collect();

        Ok(SemanticNetwork { themes, links })
    }

    fn is_theme_eligible(&self, node: &SemanticNode) -> bool {
        node.is_entity()
            && node.attr(AttrKey::Type).map_or(false, |t| !t.is_empty())
            && node.attrs.get("Aux").map(String::as_str) != Some("1")
    }

    async fn word_forms(&self, word: &str) -> Result<Vec<String>, KernelError> {
        let mut forms = vec![word.to_string()];
        for candidate in [word.to_lowercase(), word.to_uppercase()] {
            if !forms.contains(&candidate) {
                forms.push(candidate);
            }
        }
        Ok(forms)
    }

    async fn word_forms_with_pos(
        &self,
        word: &str,
    ) -> Result<(Vec<String>, Vec<String>), KernelError> {
        let forms = self.word_forms(word).await?;
        let tags = forms.iter().map(|_| "Unknown".to_string()).collect();
        Ok((forms, tags))
    }

    async fn normal_form(&self, word: &str) -> Result<Option<String>, KernelError> {
        if word.is_empty() {
            return Ok(None);
        }
        Ok(Some(word.to_lowercase()))
    }

    async fn all_normal_forms(&self, word: &str) -> Result<Vec<String>, KernelError> {
        if word.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![word.to_lowercase()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel() -> MarkupKernel {
        MarkupKernel::new()
    }

    async fn graph_of(text: &str) -> SemanticGraph {
        kernel()
            .text_to_graph(text, false, Utc::now(), SelectEntitiesMode::Full)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sentence_and_clause_structure() {
        let graph = graph_of("Раз, два. Три!").await;
        assert_eq!(graph.roots.len(), 2);
        assert_eq!(graph.roots[0].children.len(), 2);
        assert_eq!(graph.roots[1].children.len(), 1);
    }

    #[tokio::test]
    async fn test_entity_markup_is_projected_to_attrs() {
        let graph = graph_of("[[Иван|Person|Subj]] пришёл.").await;
        let entities = graph.themed_entities(true);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].display_name(), Some("Иван"));
        assert_eq!(entities[0].attr(AttrKey::Type), Some("Person"));
        assert_eq!(entities[0].attr(AttrKey::Role), Some("Subj"));
    }

    #[tokio::test]
    async fn test_aux_entities_are_not_theme_eligible() {
        let graph = graph_of("[[Иван|Person|Subj]] и [[он|Person|Subj|aux]].").await;
        let eligible: Vec<_> = graph
            .themed_entities(true)
            .into_iter()
            .filter(|n| kernel().is_theme_eligible(n))
            .collect();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].display_name(), Some("Иван"));
    }

    #[tokio::test]
    async fn test_semantic_network_links_cooccurring_themes() {
        let graph = graph_of(
            "[[Иван|Person|Subj]] видел [[Волга|Geo|Obj]]. \
             [[Иван|Person|Subj]] любит [[Волга|Geo|Obj]].",
        )
        .await;
        let network = kernel()
            .build_semantic_network(&graph, None, false)
            .await
            .unwrap();

        assert_eq!(network.themes.len(), 2);
        assert_eq!(network.links.len(), 1);
        assert_eq!(network.links[0].source_theme_id, 0);
        assert_eq!(network.links[0].dest_theme_id, 1);
        assert_eq!(network.links[0].freq, 2);
        assert_eq!(network.links[0].link_type, "related_to");
    }

    #[tokio::test]
    async fn test_word_ops_are_naive_but_total() {
        let k = kernel();
        assert!(k.word_forms("Волга").await.unwrap().contains(&"волга".to_string()));
        assert_eq!(k.normal_form("Волга").await.unwrap().as_deref(), Some("волга"));
        assert_eq!(k.normal_form("").await.unwrap(), None);
        assert_eq!(k.all_normal_forms("").await.unwrap().len(), 0);
    }
}
