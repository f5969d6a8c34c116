//! The theme aggregation pipeline

mod aggregator;
mod grouper;
mod types;

pub use aggregator::{AggregateError, ResultAggregator};
pub use grouper::group_themes;
pub use types::{
    AnalysisError, EntityMention, EntityRole, EntityType, Link, Opinion, OpinionMiningResult,
    Options, ProcessingResult, SecondaryResult, Theme, TonalityObject, TonalityResult,
};
