//! Theme grouping: raw entity mentions → deduplicated, frequency-annotated themes
//!
//! Grouping is pure and deterministic. Mentions merge on case-insensitive
//! name plus exact type; theme ids follow first-seen group order, kept
//! stable by an insertion-ordered index.

use super::types::{AnalysisError, EntityMention, EntityType, Theme};
use crate::graph::{SemanticGraph, SemanticNode};
use std::collections::HashMap;

/// Group the graph's entity mentions into canonical themes.
///
/// `is_theme_eligible` is the kernel's per-node eligibility predicate;
/// entities it rejects contribute to no group. With `include_all_subthemes`
/// unset, only entities in top-level sub-sentences are considered.
///
/// Fails fatally on the first mention whose `Type` attribute does not
/// parse; no partial theme list is produced. Empty input yields an empty
/// vec, not an error.
pub fn group_themes<F>(
    graph: &SemanticGraph,
    include_all_subthemes: bool,
    is_theme_eligible: F,
) -> Result<Vec<Theme>, AnalysisError>
where
    F: Fn(&SemanticNode) -> bool,
{
    let mut index: HashMap<(String, EntityType), usize> = HashMap::new();
    let mut themes: Vec<Theme> = Vec::new();

    for node in graph.themed_entities(include_all_subthemes) {
        if !is_theme_eligible(node) {
            continue;
        }
        let mention = EntityMention::from_node(node)?;
        let key = (mention.name.to_uppercase(), mention.entity_type);
        let idx = match index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = themes.len();
                themes.push(Theme::new(idx, mention.name.clone(), mention.entity_type));
                index.insert(key, idx);
                idx
            }
        };
        themes[idx].count_role(mention.role);
    }

    Ok(themes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttrKey, NodeKind, SemanticNode};

    fn entity(name: &str, entity_type: &str, role: Option<&str>) -> SemanticNode {
        let mut node = SemanticNode::new(NodeKind::Entity)
            .with_attr(AttrKey::Value, name)
            .with_attr(AttrKey::Type, entity_type);
        if let Some(role) = role {
            node = node.with_attr(AttrKey::Role, role);
        }
        node
    }

    fn graph_of(entities: Vec<SemanticNode>) -> SemanticGraph {
        let mut clause = SemanticNode::new(NodeKind::SubSentence);
        for e in entities {
            clause = clause.with_child(e);
        }
        SemanticGraph::new().with_root(SemanticNode::new(NodeKind::Sentence).with_child(clause))
    }

    #[test]
    fn test_case_insensitive_merge() {
        let graph = graph_of(vec![
            entity("Иван", "Person", Some("Subj")),
            entity("ИВАН", "Person", Some("Obj")),
            entity("Maria", "Person", Some("Subj")),
        ]);

        let themes = group_themes(&graph, false, |_| true).unwrap();

        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].id, 0);
        assert_eq!(themes[0].name, "Иван");
        assert_eq!(themes[0].freq_subj, 1);
        assert_eq!(themes[0].freq_obj, 1);
        assert_eq!(themes[1].id, 1);
        assert_eq!(themes[1].name, "Maria");
        assert_eq!(themes[1].freq_subj, 1);
    }

    #[test]
    fn test_same_name_different_type_stays_split() {
        let graph = graph_of(vec![
            entity("Волга", "Geo", Some("Subj")),
            entity("Волга", "Product", Some("Subj")),
        ]);

        let themes = group_themes(&graph, false, |_| true).unwrap();
        assert_eq!(themes.len(), 2);
    }

    #[test]
    fn test_unrecognized_role_joins_group_but_counts_nowhere() {
        let graph = graph_of(vec![
            entity("Иван", "Person", Some("Subj")),
            entity("Иван", "Person", Some("Predicate")),
            entity("Иван", "Person", None),
        ]);

        let themes = group_themes(&graph, false, |_| true).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].total_role_freq(), 1);
    }

    #[test]
    fn test_counter_sum_matches_recognized_mentions() {
        let graph = graph_of(vec![
            entity("Иван", "Person", Some("Subj")),
            entity("Иван", "Person", Some("Obj")),
            entity("Иван", "Person", Some("Adj")),
            entity("Иван", "Person", Some("Other")),
        ]);

        let themes = group_themes(&graph, false, |_| true).unwrap();
        assert_eq!(themes[0].total_role_freq(), 4);
    }

    #[test]
    fn test_ineligible_entities_are_dropped() {
        let graph = graph_of(vec![
            entity("Иван", "Person", Some("Subj")),
            entity("вчера", "Date", Some("Obj")),
        ]);

        let themes =
            group_themes(&graph, false, |n| n.attr(AttrKey::Type) != Some("Date")).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Иван");
    }

    #[test]
    fn test_unparseable_type_is_fatal() {
        let graph = graph_of(vec![
            entity("Иван", "Person", Some("Subj")),
            entity("x", "Foo", None),
        ]);

        let err = group_themes(&graph, false, |_| true).unwrap_err();
        assert!(err.to_string().contains("Foo"));
    }

    #[test]
    fn test_empty_graph_yields_empty_list() {
        let themes = group_themes(&SemanticGraph::new(), false, |_| true).unwrap();
        assert!(themes.is_empty());
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let graph = graph_of(vec![
            entity("Иван", "Person", Some("Subj")),
            entity("Maria", "Person", Some("Obj")),
            entity("ИВАН", "Person", Some("Adj")),
        ]);

        let first = group_themes(&graph, false, |_| true).unwrap();
        let second = group_themes(&graph, false, |_| true).unwrap();
        assert_eq!(first, second);
    }
}
