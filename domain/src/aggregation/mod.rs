//! Response aggregation
//!
//! Near-duplicate suggestions from different models are merged into
//! clusters, each scored with a confidence that grows with the number of
//! agreeing sources and how closely they agree.

pub mod cluster;
pub mod normalize;

pub use cluster::{AggregationParams, Suggestion, SuggestionCluster, aggregate};
pub use normalize::{jaccard, normalize, token_set};
