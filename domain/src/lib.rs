//! Domain layer for llm-council
//!
//! This crate contains the core entities, value objects and pure algorithms
//! of the council pipeline. It has no async runtime and no I/O.
//!
//! # Core Concepts
//!
//! ## Council run
//!
//! A prompt is answered by several independent models in three stages:
//!
//! - **Initial**: every selected model drafts an answer on its own
//! - **Meta**: each model revises its draft after reading all drafts
//! - **Ultra**: one model synthesizes the revisions into the final answer
//!
//! ## Supporting algorithms
//!
//! - **Selection**: which registered models take part ([`selection`])
//! - **Circuit breaking**: keeping failing backends out ([`resilience`])
//! - **Aggregation**: clustering near-duplicate suggestions ([`aggregation`])
//! - **Fingerprints**: cache keys for equivalent requests ([`cache`])

pub mod aggregation;
pub mod cache;
pub mod core;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod resilience;
pub mod selection;
pub mod util;

// Re-export commonly used types
pub use aggregation::{AggregationParams, Suggestion, SuggestionCluster, aggregate};
pub use cache::Fingerprint;
pub use core::{error::DomainError, model::ModelId, prompt::Prompt};
pub use pipeline::{
    event::{EventEnvelope, PipelineEvent},
    request::{PipelineRequest, RequestDefaults, RequestPayload, generate_correlation_id},
    result::{ErrorBody, ModelResponseEntry, PipelineResult, ResponseStatus, ResultStatus},
    run::{PipelineRun, RunFailure, RunStatus, StageRecord, StageVerdict},
    stage::{Stage, StageOutcome, StageResult},
};
pub use prompt::{PromptTemplate, StagePrompt};
pub use registry::descriptor::{
    CAPABILITY_LOW_LATENCY, CAPABILITY_PREMIUM, HealthStatus, ModelDescriptor,
};
pub use resilience::{BreakerPolicy, BreakerState, CircuitState};
pub use selection::{MIN_MODELS, SelectionError, SelectionPolicy, resolve_ultra, select};
