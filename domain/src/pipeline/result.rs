//! Wire result returned to clients

use super::run::{PipelineRun, RunStatus};
use super::stage::StageOutcome;
use crate::aggregation::cluster::SuggestionCluster;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client-facing status of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
    Degraded,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Error => "error",
            ResultStatus::Degraded => "degraded",
        }
    }
}

impl From<RunStatus> for ResultStatus {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Complete => ResultStatus::Success,
            RunStatus::Degraded => ResultStatus::Degraded,
            // A run is only converted once it has settled.
            RunStatus::Running | RunStatus::Failed => ResultStatus::Error,
        }
    }
}

/// Per-model response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// One model's latest draft as reported to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponseEntry {
    pub model: String,
    /// The draft on success, the error message otherwise
    pub response: String,
    pub status: ResponseStatus,
}

/// Error body carried by failed results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Final result of a submitted request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub correlation_id: String,
    pub status: ResultStatus,
    pub model_responses: BTreeMap<String, ModelResponseEntry>,
    pub combined_response: String,
    pub models_used: Vec<String>,
    pub pattern_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultra_model: Option<String>,
    /// Seconds from submission to result
    pub processing_time: f64,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<SuggestionCluster>,
    pub error: Option<ErrorBody>,
}

impl PipelineResult {
    /// Build the wire result of a settled run.
    ///
    /// Failed runs still carry whatever model responses succeeded.
    pub fn from_run(run: &PipelineRun, processing_time: f64, cached: bool) -> Self {
        let model_responses = run
            .latest_results()
            .into_iter()
            .map(|r| {
                let entry = match r.outcome {
                    StageOutcome::Success => ModelResponseEntry {
                        model: r.model.to_string(),
                        response: r.output.clone(),
                        status: ResponseStatus::Success,
                    },
                    StageOutcome::Timeout | StageOutcome::Error => ModelResponseEntry {
                        model: r.model.to_string(),
                        response: r.error.clone().unwrap_or_default(),
                        status: ResponseStatus::Error,
                    },
                };
                (r.model.to_string(), entry)
            })
            .collect();

        Self {
            correlation_id: run.correlation_id().to_string(),
            status: run.status().into(),
            model_responses,
            combined_response: run.final_text().unwrap_or_default().to_string(),
            models_used: run.models_used().iter().map(|m| m.to_string()).collect(),
            pattern_used: run.request().pattern().to_string(),
            ultra_model: run.ultra_model().map(|m| m.to_string()),
            processing_time,
            cached,
            suggestions: run.suggestions().to_vec(),
            error: run.failure().map(|f| ErrorBody {
                code: f.code.clone(),
                message: f.message.clone(),
            }),
        }
    }

    /// Result for a request rejected before any stage ran
    pub fn rejected(
        correlation_id: impl Into<String>,
        pattern: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        processing_time: f64,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            status: ResultStatus::Error,
            model_responses: BTreeMap::new(),
            combined_response: String::new(),
            models_used: Vec::new(),
            pattern_used: pattern.into(),
            ultra_model: None,
            processing_time,
            cached: false,
            suggestions: Vec::new(),
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}
