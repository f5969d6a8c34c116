//! Result assembly: selects the aggregation route and builds the final record
//!
//! Two routes produce themes: raw-graph grouping (the default) and the
//! kernel's pre-built semantic network (when `SEM_NET` is requested with
//! `THEME_LIST`). Only the semantic-network route yields links.

use super::grouper::group_themes;
use super::types::{AnalysisError, Link, Options, ProcessingResult, Theme};
use crate::graph::SemanticGraph;
use crate::kernel::{CoreferenceInfo, KernelError, LanguageKernel, LinkTuple, ThemeTuple};

/// Errors raised while assembling a result
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Assembles a [`ProcessingResult`] from a graph and the requested options
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self
    }

    /// Build the result record for one request.
    ///
    /// Callers short-circuit `options == NONE` before reaching this point;
    /// a request with neither `RDF` nor `THEME_LIST` set still produces a
    /// legal all-`None` result here.
    pub async fn build(
        &self,
        kernel: &dyn LanguageKernel,
        graph: &SemanticGraph,
        coreference: Option<&CoreferenceInfo>,
        options: Options,
        include_all_subthemes: bool,
    ) -> Result<ProcessingResult, AggregateError> {
        let mut result = ProcessingResult::default();

        if options.has(Options::RDF) {
            result.rdf = Some(graph.to_canonical_string());
        }

        if options.has(Options::THEME_LIST) {
            if options.has(Options::SEM_NET) {
                let network = kernel
                    .build_semantic_network(graph, coreference, include_all_subthemes)
                    .await?;
                let themes: Vec<Theme> = network
                    .themes
                    .iter()
                    .map(map_theme)
                    .collect::<Result<_, _>>()?;
                result.themes = Some(themes);
                result.links = Some(network.links.iter().map(map_link).collect());
            } else {
                let themes =
                    group_themes(graph, include_all_subthemes, |n| kernel.is_theme_eligible(n))?;
                result.themes = Some(themes);
            }
        }

        Ok(result)
    }
}

/// Map a kernel theme tuple, re-validating its type string
fn map_theme(tuple: &ThemeTuple) -> Result<Theme, AnalysisError> {
    let entity_type = tuple.type_name.parse()?;
    Ok(Theme {
        id: tuple.id,
        name: tuple.name.clone(),
        original_name: tuple.original_name.clone(),
        entity_type,
        freq_adj: tuple.freq_adj,
        freq_subj: tuple.freq_subj,
        freq_obj: tuple.freq_obj,
        freq_other: tuple.freq_other,
    })
}

fn map_link(tuple: &LinkTuple) -> Link {
    Link {
        source_theme_id: tuple.source_theme_id,
        dest_theme_id: tuple.dest_theme_id,
        link_type: tuple.link_type.clone(),
        freq: tuple.freq,
    }
}
