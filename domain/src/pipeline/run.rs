//! Pipeline run entity

use super::request::PipelineRequest;
use super::stage::{Stage, StageResult};
use crate::aggregation::cluster::SuggestionCluster;
use crate::core::model::ModelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    /// At least one stage lost some (but not all) of its models
    Degraded,
    Complete,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Degraded => "degraded",
            RunStatus::Complete => "complete",
            RunStatus::Failed => "failed",
        }
    }
}

/// Results of one settled stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub results: Vec<StageResult>,
}

impl StageRecord {
    pub fn successes(&self) -> impl Iterator<Item = &StageResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }
}

/// How a settled stage affects the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageVerdict {
    /// Every dispatched model succeeded
    Complete,
    /// Some models failed; the run continues degraded
    Partial { successes: usize, requested: usize },
    /// No model succeeded; the run has failed
    Exhausted,
}

/// Error that ended a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub code: String,
    pub message: String,
}

/// Record of a council run (Entity)
///
/// Owned by the orchestrator for the lifetime of the run. The stage list is
/// append-only: stages are recorded in order and never removed.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    request: PipelineRequest,
    stages: Vec<StageRecord>,
    final_text: Option<String>,
    ultra_model: Option<ModelId>,
    status: RunStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    suggestions: Vec<SuggestionCluster>,
    failure: Option<RunFailure>,
}

impl PipelineRun {
    pub fn new(request: PipelineRequest) -> Self {
        Self {
            request,
            stages: Vec::new(),
            final_text: None,
            ultra_model: None,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            suggestions: Vec::new(),
            failure: None,
        }
    }

    pub fn correlation_id(&self) -> &str {
        self.request.correlation_id()
    }

    pub fn request(&self) -> &PipelineRequest {
        &self.request
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn final_text(&self) -> Option<&str> {
        self.final_text.as_deref()
    }

    pub fn ultra_model(&self) -> Option<&ModelId> {
        self.ultra_model.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn suggestions(&self) -> &[SuggestionCluster] {
        &self.suggestions
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    /// Append a settled stage and fold its outcome into the run status.
    pub fn record_stage(&mut self, stage: Stage, results: Vec<StageResult>) -> StageVerdict {
        debug_assert_eq!(
            usize::from(stage.index()),
            self.stages.len() + 1,
            "stages must be recorded in order"
        );

        let requested = results.len();
        let successes = results.iter().filter(|r| r.is_success()).count();
        self.stages.push(StageRecord { stage, results });

        if successes == 0 {
            self.fail(
                "STAGE_EXHAUSTED",
                format!("{} stage: none of {} models succeeded", stage.as_str(), requested),
            );
            StageVerdict::Exhausted
        } else if successes < requested {
            if self.status == RunStatus::Running {
                self.status = RunStatus::Degraded;
            }
            StageVerdict::Partial {
                successes,
                requested,
            }
        } else {
            StageVerdict::Complete
        }
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<SuggestionCluster>) {
        self.suggestions = suggestions;
    }

    /// Finish the run with the synthesized response.
    ///
    /// A degraded run stays degraded.
    pub fn complete(&mut self, final_text: impl Into<String>, ultra_model: ModelId) {
        self.final_text = Some(final_text.into());
        self.ultra_model = Some(ultra_model);
        if self.status == RunStatus::Running {
            self.status = RunStatus::Complete;
        }
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.failure = Some(RunFailure {
            code: code.into(),
            message: message.into(),
        });
        self.finished_at = Some(Utc::now());
    }

    /// Models that completed at least the initial stage, in dispatch order
    pub fn models_used(&self) -> Vec<ModelId> {
        self.stage(Stage::Initial)
            .map(|r| r.successes().map(|s| s.model.clone()).collect())
            .unwrap_or_default()
    }

    /// Most refined result per initial-stage model.
    ///
    /// The meta revision when it succeeded, else the initial draft; models
    /// that never succeeded report their latest failure.
    pub fn latest_results(&self) -> Vec<&StageResult> {
        let Some(initial) = self.stage(Stage::Initial) else {
            return Vec::new();
        };
        let meta = self.stage(Stage::Meta);
        initial
            .results
            .iter()
            .map(|first| {
                let revised = meta.and_then(|m| m.results.iter().find(|r| r.model == first.model));
                match revised {
                    Some(r) if r.is_success() => r,
                    Some(r) if !first.is_success() => r,
                    _ => first,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::request::{RequestDefaults, RequestPayload};
    use std::time::Duration;

    fn id(s: &str) -> ModelId {
        ModelId::new(s).unwrap()
    }

    fn run() -> PipelineRun {
        let request = PipelineRequest::from_payload(
            RequestPayload::new("Summarize X").with_models(["a", "b", "c"]),
            &RequestDefaults::default(),
        )
        .unwrap();
        PipelineRun::new(request)
    }

    fn ok(stage: Stage, m: &str, text: &str) -> StageResult {
        StageResult::success(stage, id(m), text, Duration::from_millis(10))
    }

    fn timeout(stage: Stage, m: &str) -> StageResult {
        StageResult::timeout(stage, id(m), Duration::from_secs(1))
    }

    #[test]
    fn test_complete_run() {
        let mut run = run();
        assert_eq!(run.status(), RunStatus::Running);
        let v = run.record_stage(
            Stage::Initial,
            vec![ok(Stage::Initial, "a", "1"), ok(Stage::Initial, "b", "2")],
        );
        assert_eq!(v, StageVerdict::Complete);
        run.record_stage(Stage::Meta, vec![ok(Stage::Meta, "a", "1'"), ok(Stage::Meta, "b", "2'")]);
        run.record_stage(Stage::Ultra, vec![ok(Stage::Ultra, "a", "final")]);
        run.complete("final", id("a"));

        assert_eq!(run.status(), RunStatus::Complete);
        assert_eq!(run.final_text(), Some("final"));
        assert_eq!(run.stages().len(), 3);
        assert!(run.finished_at().is_some());
    }

    #[test]
    fn test_partial_stage_degrades_and_stays_degraded() {
        let mut run = run();
        let v = run.record_stage(
            Stage::Initial,
            vec![
                ok(Stage::Initial, "a", "1"),
                ok(Stage::Initial, "b", "2"),
                timeout(Stage::Initial, "c"),
            ],
        );
        assert_eq!(
            v,
            StageVerdict::Partial {
                successes: 2,
                requested: 3
            }
        );
        assert_eq!(run.status(), RunStatus::Degraded);
        run.complete("final", id("a"));
        assert_eq!(run.status(), RunStatus::Degraded);
    }

    #[test]
    fn test_exhausted_stage_fails_run() {
        let mut run = run();
        let v = run.record_stage(
            Stage::Initial,
            vec![timeout(Stage::Initial, "a"), timeout(Stage::Initial, "b")],
        );
        assert_eq!(v, StageVerdict::Exhausted);
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.failure().unwrap().code, "STAGE_EXHAUSTED");
    }

    #[test]
    fn test_models_used_and_latest_results() {
        let mut run = run();
        run.record_stage(
            Stage::Initial,
            vec![
                ok(Stage::Initial, "a", "draft a"),
                ok(Stage::Initial, "b", "draft b"),
                timeout(Stage::Initial, "c"),
            ],
        );
        run.record_stage(
            Stage::Meta,
            vec![ok(Stage::Meta, "a", "revised a"), timeout(Stage::Meta, "b")],
        );

        assert_eq!(run.models_used(), vec![id("a"), id("b")]);

        let latest: Vec<(&str, &str)> = run
            .latest_results()
            .iter()
            .map(|r| (r.model.as_str(), r.output.as_str()))
            .collect();
        assert_eq!(
            latest,
            vec![("a", "revised a"), ("b", "draft b"), ("c", "")]
        );
    }
}
