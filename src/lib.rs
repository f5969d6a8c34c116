//! Themenet: theme and relation extraction over semantic graphs
//!
//! Converts a parsed semantic representation of text (a sentence/entity
//! tree built by an external linguistic kernel) into a compact result:
//! deduplicated themes with role-frequency statistics and typed links
//! between them. Kernel access is serialized through a bounded worker
//! pool because the kernel is not safe for concurrent use.
//!
//! # Core Concepts
//!
//! - **Themes**: canonical entities merged case-insensitively by name and
//!   exactly by semantic type
//! - **Links**: directed typed relations, produced only on the
//!   semantic-network path
//! - **Workers**: exclusive kernel-controller handles checked out of a
//!   fixed-size pool for the duration of one request
//!
//! # Example
//!
//! ```
//! use themenet::{MarkupKernel, TextProcessor, Worker};
//!
//! let processor = TextProcessor::new(vec![Worker::new(Box::new(MarkupKernel::new()))]);
//! // Processor is ready for requests
//! ```

pub mod analysis;
pub mod graph;
pub mod kernel;
pub mod pool;
mod processor;

pub use analysis::{
    AnalysisError, EntityRole, EntityType, Link, Options, ProcessingResult, ResultAggregator,
    SecondaryResult, Theme,
};
pub use graph::{AttrKey, NodeId, NodeKind, SemanticGraph, SemanticNode};
pub use kernel::{
    AttrCoreference, CoreferenceInfo, CoreferenceResolver, KernelError, LanguageKernel,
    LinkTuple, MarkupKernel, ObjectAllocateMethod, OpinionMiner, SelectEntitiesMode,
    SemanticNetwork, ThemeTuple, TonalityMarker, TonalityParams,
};
pub use pool::{PoolError, WorkerLease, WorkerPool};
pub use processor::{
    requested_analyses, GraphRequest, ProcessError, SecondaryAnalysisKind, TextProcessor,
    TextRequest, Worker,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
