//! Progress events published per run

use super::result::PipelineResult;
use super::stage::{Stage, StageOutcome};
use crate::selection::policy::SelectionPolicy;
use serde::{Deserialize, Serialize};

/// Event emitted while a run progresses
///
/// Serialized as `{ "event": name, ...payload }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// First event of every subscription
    Connected,
    AnalysisStart {
        pattern: String,
        policy: SelectionPolicy,
        prompt_preview: String,
    },
    ModelSelected {
        models: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ultra_model: Option<String>,
    },
    StageStart {
        stage: Stage,
        stage_index: u8,
        models: Vec<String>,
    },
    ModelCompleted {
        stage: Stage,
        stage_index: u8,
        model: String,
        status: StageOutcome,
        latency_ms: u64,
    },
    StageComplete {
        stage: Stage,
        stage_index: u8,
        successes: usize,
        requested: usize,
    },
    PipelineComplete {
        result: Box<PipelineResult>,
    },
    ServiceUnavailable {
        code: String,
        message: String,
    },
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::Connected => "connected",
            PipelineEvent::AnalysisStart { .. } => "analysis_start",
            PipelineEvent::ModelSelected { .. } => "model_selected",
            PipelineEvent::StageStart { .. } => "stage_start",
            PipelineEvent::ModelCompleted { .. } => "model_completed",
            PipelineEvent::StageComplete { .. } => "stage_complete",
            PipelineEvent::PipelineComplete { .. } => "pipeline_complete",
            PipelineEvent::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    /// Whether this event ends the run's event stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineEvent::PipelineComplete { .. } | PipelineEvent::ServiceUnavailable { .. }
        )
    }
}

/// Event as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub correlation_id: String,
    /// Position in the run's event sequence (0 is the per-subscriber `connected`)
    pub sequence: u64,
    #[serde(flatten)]
    pub event: PipelineEvent,
}
