//! Pipeline stages and per-model stage results

use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stage of a council run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Stage 1 - every selected model drafts an answer independently
    Initial,
    /// Stage 2 - every model revises its draft after reading its peers
    Meta,
    /// Stage 3 - the ultra model synthesizes the final response
    Ultra,
}

impl Stage {
    /// 1-based stage index
    pub fn index(&self) -> u8 {
        match self {
            Stage::Initial => 1,
            Stage::Meta => 2,
            Stage::Ultra => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::Meta => "meta",
            Stage::Ultra => "ultra",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Initial => "Initial Drafts",
            Stage::Meta => "Peer Review",
            Stage::Ultra => "Ultra Synthesis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How a single model call in a stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    Success,
    Timeout,
    Error,
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageOutcome::Success => "success",
            StageOutcome::Timeout => "timeout",
            StageOutcome::Error => "error",
        }
    }
}

/// Result of one model in one stage (never mutated after creation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub model: ModelId,
    /// Model output; empty unless the call succeeded
    pub output: String,
    /// Wall-clock latency of the call in milliseconds
    pub latency_ms: u64,
    pub outcome: StageOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    pub fn success(
        stage: Stage,
        model: ModelId,
        output: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self {
            stage,
            model,
            output: output.into(),
            latency_ms: millis(latency),
            outcome: StageOutcome::Success,
            error: None,
        }
    }

    pub fn timeout(stage: Stage, model: ModelId, latency: Duration) -> Self {
        Self {
            stage,
            model,
            output: String::new(),
            latency_ms: millis(latency),
            outcome: StageOutcome::Timeout,
            error: Some(format!("timed out after {} ms", millis(latency))),
        }
    }

    pub fn failure(
        stage: Stage,
        model: ModelId,
        error: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self {
            stage,
            model,
            output: String::new(),
            latency_ms: millis(latency),
            outcome: StageOutcome::Error,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == StageOutcome::Success
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
