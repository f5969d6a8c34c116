//! Request facade: one entry point for the whole processing pipeline
//!
//! `TextProcessor` owns the worker pool and composes one end-to-end
//! request: acquire a worker → kernel → optional coreference →
//! aggregation → optional secondary analysis → release. The worker lease
//! returns to the pool on every exit path, failing requests included.

use crate::analysis::{
    AggregateError, AnalysisError, Options, ProcessingResult, ResultAggregator, SecondaryResult,
};
use crate::kernel::{
    CoreferenceInfo, CoreferenceResolver, KernelError, LanguageKernel, ObjectAllocateMethod,
    OpinionMiner, SelectEntitiesMode, TonalityMarker, TonalityParams,
};
use crate::pool::{PoolError, WorkerPool};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Errors surfaced to callers of the facade
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// A required request field was missing; checked before any worker
    /// is acquired so invalid requests never consume a permit
    #[error("required request field '{0}' is empty")]
    EmptyInput(&'static str),

    /// A secondary analysis was requested but no analyzer is configured
    #[error("requested {0} analysis has no configured analyzer")]
    AnalyzerUnavailable(SecondaryAnalysisKind),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl From<AggregateError> for ProcessError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::Analysis(e) => ProcessError::Analysis(e),
            AggregateError::Kernel(e) => ProcessError::Kernel(e),
        }
    }
}

/// The secondary analyses a request can ask for, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryAnalysisKind {
    OpinionMiningWithTonality,
    Tonality,
}

impl std::fmt::Display for SecondaryAnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecondaryAnalysisKind::OpinionMiningWithTonality => {
                write!(f, "opinion-mining-with-tonality")
            }
            SecondaryAnalysisKind::Tonality => write!(f, "tonality"),
        }
    }
}

/// Secondary analyses requested by the options, highest priority first.
///
/// Opinion mining with tonality outranks plain tonality; the facade runs
/// only the first entry.
pub fn requested_analyses(options: Options) -> Vec<SecondaryAnalysisKind> {
    let mut kinds = Vec::new();
    if options.has(Options::OPINION_MINING_WITH_TONALITY) {
        kinds.push(SecondaryAnalysisKind::OpinionMiningWithTonality);
    }
    if options.has(Options::TONALITY) {
        kinds.push(SecondaryAnalysisKind::Tonality);
    }
    kinds
}

/// One exclusive kernel-controller bundle; each pool slot holds one
pub struct Worker {
    kernel: Box<dyn LanguageKernel>,
    coreference: Option<Box<dyn CoreferenceResolver>>,
}

impl Worker {
    /// Create a worker around one kernel instance
    pub fn new(kernel: Box<dyn LanguageKernel>) -> Self {
        Self {
            kernel,
            coreference: None,
        }
    }

    /// Enable coreference resolution on this worker
    pub fn with_coreference(mut self, resolver: Box<dyn CoreferenceResolver>) -> Self {
        self.coreference = Some(resolver);
        self
    }
}

/// A raw-text processing request
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub text: String,
    pub options: Options,
    pub mode: SelectEntitiesMode,
    pub generate_all_subthemes: bool,
    pub base_date: DateTime<Utc>,
    pub after_spell_checking: bool,
    pub allocate_method: ObjectAllocateMethod,
    pub tonality_params: TonalityParams,
}

impl TextRequest {
    /// Create a request with default options (`ALL`) and current base date
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Options::ALL,
            mode: SelectEntitiesMode::default(),
            generate_all_subthemes: false,
            base_date: Utc::now(),
            after_spell_checking: false,
            allocate_method: ObjectAllocateMethod::default(),
            tonality_params: TonalityParams::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_all_subthemes(mut self, enabled: bool) -> Self {
        self.generate_all_subthemes = enabled;
        self
    }

    pub fn with_base_date(mut self, base_date: DateTime<Utc>) -> Self {
        self.base_date = base_date;
        self
    }
}

/// A pre-serialized graph processing request
#[derive(Debug, Clone)]
pub struct GraphRequest {
    pub rdf: String,
    pub options: Options,
    pub generate_all_subthemes: bool,
    pub allocate_method: ObjectAllocateMethod,
    pub tonality_params: TonalityParams,
}

impl GraphRequest {
    /// Create a request with default options (`ALL`)
    pub fn new(rdf: impl Into<String>) -> Self {
        Self {
            rdf: rdf.into(),
            options: Options::ALL,
            generate_all_subthemes: false,
            allocate_method: ObjectAllocateMethod::default(),
            tonality_params: TonalityParams::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_all_subthemes(mut self, enabled: bool) -> Self {
        self.generate_all_subthemes = enabled;
        self
    }
}

/// Single entry point for all processing requests.
///
/// Holds the worker pool (dependency-injected, created once at service
/// start) and the optional secondary analyzers shared across workers.
pub struct TextProcessor {
    pool: WorkerPool<Worker>,
    aggregator: ResultAggregator,
    opinion_miner: Option<Arc<dyn OpinionMiner>>,
    tonality_marker: Option<Arc<dyn TonalityMarker>>,
}

impl TextProcessor {
    /// Create a processor over the given workers.
    ///
    /// The pool size is `workers.len()` and never changes; one worker is
    /// the degenerate but common deployment, making the pool a mutex
    /// around the kernel.
    pub fn new(workers: Vec<Worker>) -> Self {
        Self {
            pool: WorkerPool::new(workers),
            aggregator: ResultAggregator::new(),
            opinion_miner: None,
            tonality_marker: None,
        }
    }

    /// Configure an opinion mining analyzer
    pub fn with_opinion_miner(mut self, miner: Arc<dyn OpinionMiner>) -> Self {
        self.opinion_miner = Some(miner);
        self
    }

    /// Configure a tonality marking analyzer
    pub fn with_tonality_marker(mut self, marker: Arc<dyn TonalityMarker>) -> Self {
        self.tonality_marker = Some(marker);
        self
    }

    /// Number of pooled workers
    pub fn worker_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of workers currently free
    pub fn available_workers(&self) -> usize {
        self.pool.available()
    }

    /// Shut the processor down.
    ///
    /// In-flight requests complete; later calls fail with a pool error.
    /// Kernel resources are released when the processor is dropped.
    pub fn shutdown(&self) {
        self.pool.close();
    }

    /// Process raw text.
    ///
    /// `Ok(None)` means the request asked for nothing (`options == NONE`);
    /// no kernel work happens and no worker is consumed. A present result
    /// with all fields `None` is a different, legal outcome of a request
    /// that asked only for unavailable components.
    pub async fn process_text(
        &self,
        request: &TextRequest,
    ) -> Result<Option<ProcessingResult>, ProcessError> {
        if request.text.trim().is_empty() {
            return Err(ProcessError::EmptyInput("text"));
        }
        if request.options.is_none() {
            return Ok(None);
        }

        let worker = self.pool.acquire().await?;
        tracing::debug!(
            text_len = request.text.len(),
            options = request.options.0,
            "processing text request"
        );
        let graph = worker
            .kernel
            .text_to_graph(
                &request.text,
                request.after_spell_checking,
                request.base_date,
                request.mode,
            )
            .await?;
        let coreference = match &worker.coreference {
            Some(resolver) => Some(resolver.resolve(&graph)?),
            None => None,
        };
        let result = self
            .aggregator
            .build(
                worker.kernel.as_ref(),
                &graph,
                coreference.as_ref(),
                request.options,
                request.generate_all_subthemes,
            )
            .await?;
        let result = self
            .attach_secondary(
                result,
                &graph,
                coreference.as_ref(),
                request.options,
                request.allocate_method,
                &request.tonality_params,
            )
            .await?;
        Ok(Some(result))
    }

    /// Process a previously serialized graph.
    ///
    /// A request for `RDF` alone is a pure passthrough and short-circuits
    /// to `Ok(None)` without acquiring a worker, as does `options == NONE`.
    pub async fn process_graph(
        &self,
        request: &GraphRequest,
    ) -> Result<Option<ProcessingResult>, ProcessError> {
        if request.rdf.trim().is_empty() {
            return Err(ProcessError::EmptyInput("rdf"));
        }
        if request.options.is_none() || request.options == Options::RDF {
            return Ok(None);
        }

        let worker = self.pool.acquire().await?;
        tracing::debug!(
            rdf_len = request.rdf.len(),
            options = request.options.0,
            "processing graph request"
        );
        let graph = worker.kernel.parse_graph(&request.rdf)?;
        let coreference = match &worker.coreference {
            Some(resolver) => Some(resolver.read_from_graph(&graph)?),
            None => None,
        };
        let result = self
            .aggregator
            .build(
                worker.kernel.as_ref(),
                &graph,
                coreference.as_ref(),
                request.options,
                request.generate_all_subthemes,
            )
            .await?;
        let result = self
            .attach_secondary(
                result,
                &graph,
                coreference.as_ref(),
                request.options,
                request.allocate_method,
                &request.tonality_params,
            )
            .await?;
        Ok(Some(result))
    }

    /// All inflected forms of a word
    pub async fn word_forms(&self, word: &str) -> Result<Vec<String>, ProcessError> {
        let worker = self.pool.acquire().await?;
        Ok(worker.kernel.word_forms(word).await?)
    }

    /// All inflected forms paired with part-of-speech tags
    pub async fn word_forms_with_pos(
        &self,
        word: &str,
    ) -> Result<(Vec<String>, Vec<String>), ProcessError> {
        let worker = self.pool.acquire().await?;
        Ok(worker.kernel.word_forms_with_pos(word).await?)
    }

    /// Normal form of a word; falls back to the word itself when the
    /// kernel knows none
    pub async fn normal_form(&self, word: &str) -> Result<String, ProcessError> {
        let worker = self.pool.acquire().await?;
        let normal = worker.kernel.normal_form(word).await?;
        Ok(match normal {
            Some(form) if !form.is_empty() => form,
            _ => word.to_string(),
        })
    }

    /// All distinct non-empty normal forms; falls back to the word itself
    pub async fn all_normal_forms(&self, word: &str) -> Result<Vec<String>, ProcessError> {
        let worker = self.pool.acquire().await?;
        let mut seen = HashSet::new();
        let mut forms: Vec<String> = worker
            .kernel
            .all_normal_forms(word)
            .await?
            .into_iter()
            .filter(|form| !form.is_empty() && seen.insert(form.clone()))
            .collect();
        if forms.is_empty() {
            forms.push(word.to_string());
        }
        Ok(forms)
    }

    /// Run the highest-priority requested secondary analysis, if any
    async fn attach_secondary(
        &self,
        mut base: ProcessingResult,
        graph: &crate::graph::SemanticGraph,
        coreference: Option<&CoreferenceInfo>,
        options: Options,
        allocate_method: ObjectAllocateMethod,
        tonality_params: &TonalityParams,
    ) -> Result<ProcessingResult, ProcessError> {
        let Some(&kind) = requested_analyses(options).first() else {
            return Ok(base);
        };
        match kind {
            SecondaryAnalysisKind::OpinionMiningWithTonality => {
                let miner = self
                    .opinion_miner
                    .as_ref()
                    .ok_or(ProcessError::AnalyzerUnavailable(kind))?;
                let output = miner.run(graph, coreference, allocate_method).await?;
                base.secondary = Some(SecondaryResult::OpinionMining(output));
            }
            SecondaryAnalysisKind::Tonality => {
                let marker = self
                    .tonality_marker
                    .as_ref()
                    .ok_or(ProcessError::AnalyzerUnavailable(kind))?;
                let output = marker
                    .run(graph, coreference, allocate_method, tonality_params)
                    .await?;
                base.secondary = Some(SecondaryResult::Tonality(output));
            }
        }
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::MarkupKernel;

    fn processor() -> TextProcessor {
        TextProcessor::new(vec![Worker::new(Box::new(MarkupKernel::new()))])
    }

    #[test]
    fn test_secondary_priority_order_is_fixed() {
        let both = Options::OPINION_MINING_WITH_TONALITY | Options::TONALITY;
        assert_eq!(
            requested_analyses(both),
            vec![
                SecondaryAnalysisKind::OpinionMiningWithTonality,
                SecondaryAnalysisKind::Tonality,
            ]
        );
        assert_eq!(
            requested_analyses(Options::TONALITY),
            vec![SecondaryAnalysisKind::Tonality]
        );
        assert!(requested_analyses(Options::ALL).is_empty());
    }

    #[tokio::test]
    async fn test_none_options_short_circuits_to_absent_result() {
        let processor = processor();
        let request = TextRequest::new("Иван пришёл.").with_options(Options::NONE);
        let result = processor.process_text(&request).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_processing() {
        let processor = processor();
        let request = TextRequest::new("   ");
        let err = processor.process_text(&request).await.unwrap_err();
        assert!(matches!(err, ProcessError::EmptyInput("text")));
        assert_eq!(processor.available_workers(), processor.worker_capacity());
    }

    #[tokio::test]
    async fn test_rdf_only_graph_request_is_passthrough_noop() {
        let processor = processor();
        let graph_text = crate::graph::SemanticGraph::new().to_canonical_string();
        let request = GraphRequest::new(graph_text).with_options(Options::RDF);
        let result = processor.process_graph(&request).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_malformed_graph_text_propagates_parse_failure() {
        let processor = processor();
        let request = GraphRequest::new("{broken").with_options(Options::THEME_LIST);
        let err = processor.process_graph(&request).await.unwrap_err();
        assert!(matches!(err, ProcessError::Kernel(_)));
        // The failing request must not leak its permit
        assert_eq!(processor.available_workers(), processor.worker_capacity());
    }

    #[tokio::test]
    async fn test_requested_analysis_without_analyzer_errors() {
        let processor = processor();
        let request =
            TextRequest::new("Иван пришёл.").with_options(Options::THEME_LIST | Options::TONALITY);
        let err = processor.process_text(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ProcessError::AnalyzerUnavailable(SecondaryAnalysisKind::Tonality)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_requests() {
        let processor = processor();
        processor.shutdown();
        let request = TextRequest::new("Иван пришёл.");
        let err = processor.process_text(&request).await.unwrap_err();
        assert!(matches!(err, ProcessError::Pool(_)));
    }

    #[tokio::test]
    async fn test_normal_form_falls_back_to_input() {
        let processor = processor();
        assert_eq!(processor.normal_form("").await.unwrap(), "");
        assert_eq!(processor.normal_form("Волга").await.unwrap(), "волга");
    }

    #[tokio::test]
    async fn test_all_normal_forms_deduplicates_and_falls_back() {
        let processor = processor();
        let forms = processor.all_normal_forms("").await.unwrap();
        assert_eq!(forms, vec!["".to_string()]);
        let forms = processor.all_normal_forms("Волга").await.unwrap();
        assert_eq!(forms, vec!["волга".to_string()]);
    }
}
