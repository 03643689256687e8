//! Run Pipeline use case
//!
//! Orchestrates a full council run: cache lookup, model selection, the
//! three stages, aggregation of the revised answers and the cache write.

use super::execute_stage::{StageCall, StageExecutor, StageLimits};
use crate::config::PipelineSettings;
use crate::ports::events::EventPublisher;
use crate::ports::model_backend::ModelBackend;
use crate::services::cache::ResultCache;
use crate::services::circuit_breaker::CircuitBreakerBank;
use crate::services::registry::ModelRegistry;
use council_domain::util::truncate_chars;
use council_domain::{
    DomainError, Fingerprint, ModelDescriptor, ModelId, PipelineEvent, PipelineRequest,
    PipelineResult, PipelineRun, PromptTemplate, RequestPayload, RunStatus, SelectionError, Stage,
    StageResult, StageVerdict, Suggestion, aggregate, generate_correlation_id, resolve_ultra,
    select,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const PROMPT_PREVIEW_CHARS: usize = 80;

/// Errors that stop a run before its first stage
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Run {0} is already in flight")]
    DuplicateRun(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl PipelineError {
    /// Wire error code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Validation(e) => e.code(),
            PipelineError::DuplicateRun(_) => "VALIDATION_ERROR",
            PipelineError::Selection(e) => e.code(),
        }
    }
}

/// Removes a run from the in-flight table when it ends, however it ends.
struct ActiveRun<'a> {
    table: &'a Mutex<HashMap<String, CancellationToken>>,
    correlation_id: String,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.correlation_id);
    }
}

/// Use case for running the council pipeline
pub struct RunPipelineUseCase {
    registry: Arc<ModelRegistry>,
    breakers: Arc<CircuitBreakerBank>,
    cache: Arc<ResultCache>,
    events: Arc<dyn EventPublisher>,
    executor: StageExecutor,
    settings: PipelineSettings,
    active: Mutex<HashMap<String, CancellationToken>>,
}

impl RunPipelineUseCase {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        registry: Arc<ModelRegistry>,
        breakers: Arc<CircuitBreakerBank>,
        cache: Arc<ResultCache>,
        events: Arc<dyn EventPublisher>,
        settings: PipelineSettings,
    ) -> Self {
        let executor = StageExecutor::new(backend, Arc::clone(&breakers), Arc::clone(&events));
        Self {
            registry,
            breakers,
            cache,
            events,
            executor,
            settings,
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Validate and run a wire request.
    ///
    /// Never fails: rejections and failed runs come back as a result with
    /// status `error` and an error body.
    pub async fn submit(&self, payload: RequestPayload) -> PipelineResult {
        let started = Instant::now();
        let fallback_id = payload
            .correlation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_correlation_id);
        let fallback_pattern = payload
            .pattern
            .clone()
            .unwrap_or_else(|| self.settings.defaults.pattern.clone());

        let request = match PipelineRequest::from_payload(payload, &self.settings.defaults) {
            Ok(request) => request,
            Err(e) => {
                let error = PipelineError::from(e);
                warn!("Rejected request {}: {}", fallback_id, error);
                // An id held by a live run keeps its stream; the rejection
                // is only reported in the returned result.
                match self.claim(&fallback_id) {
                    Some(_claim) => {
                        self.events.begin(&fallback_id);
                        self.publish_unavailable(&fallback_id, &error);
                    }
                    None => debug!("Run {} is in flight, rejection not published", fallback_id),
                }
                return PipelineResult::rejected(
                    fallback_id,
                    fallback_pattern,
                    error.code(),
                    error.to_string(),
                    seconds_since(started),
                );
            }
        };

        let correlation_id = request.correlation_id().to_string();
        let pattern = request.pattern().to_string();
        match self.run(request, started).await {
            Ok((_, result)) => result,
            Err(error) => PipelineResult::rejected(
                correlation_id,
                pattern,
                error.code(),
                error.to_string(),
                seconds_since(started),
            ),
        }
    }

    /// Run a validated request.
    ///
    /// `Err` means the run never started (duplicate id, selection failure).
    /// Runs that started come back as `Ok` whatever their status; a cache
    /// hit returns the stored run.
    pub async fn execute(&self, request: PipelineRequest) -> Result<PipelineRun, PipelineError> {
        self.run(request, Instant::now()).await.map(|(run, _)| run)
    }

    /// Cancel an in-flight run; returns whether one was found.
    pub fn cancel(&self, correlation_id: &str) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match active.get(correlation_id) {
            Some(token) => {
                info!("Cancelling run {}", correlation_id);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Correlation ids of the runs in flight, sorted
    pub fn active_runs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    async fn run(
        &self,
        request: PipelineRequest,
        started: Instant,
    ) -> Result<(PipelineRun, PipelineResult), PipelineError> {
        let correlation_id = request.correlation_id().to_string();

        // A duplicate must not touch the event stream of the run it collides with.
        let Some((cancel, _active)) = self.claim(&correlation_id) else {
            warn!("Run {} is already in flight", correlation_id);
            return Err(PipelineError::DuplicateRun(correlation_id));
        };
        self.events.begin(&correlation_id);

        let outcome = self.drive(request, &cancel, started).await;
        if let Err(error) = &outcome {
            warn!("Run {} did not start: {}", correlation_id, error);
            self.publish_unavailable(&correlation_id, error);
        }
        outcome
    }

    /// Reserve `correlation_id` in the in-flight table.
    ///
    /// `None` when another run holds it. The id is released when the
    /// returned guard drops.
    fn claim(&self, correlation_id: &str) -> Option<(CancellationToken, ActiveRun<'_>)> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.contains_key(correlation_id) {
            return None;
        }
        let token = CancellationToken::new();
        active.insert(correlation_id.to_string(), token.clone());
        Some((
            token,
            ActiveRun {
                table: &self.active,
                correlation_id: correlation_id.to_string(),
            },
        ))
    }

    async fn drive(
        &self,
        request: PipelineRequest,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<(PipelineRun, PipelineResult), PipelineError> {
        let correlation_id = request.correlation_id().to_string();
        info!(
            "Starting run {} (policy {}, pattern {})",
            correlation_id,
            request.policy().as_str(),
            request.pattern()
        );
        self.events.publish(
            &correlation_id,
            PipelineEvent::AnalysisStart {
                pattern: request.pattern().to_string(),
                policy: request.policy(),
                prompt_preview: truncate_chars(
                    &request.prompt().normalized(),
                    PROMPT_PREVIEW_CHARS,
                ),
            },
        );

        let fingerprint = Fingerprint::of(&request);
        if self.settings.cache_enabled
            && let Some(cached) = self.cache.get(&fingerprint)
        {
            info!("Run {} served from cache ({})", correlation_id, fingerprint);
            let mut result = PipelineResult::from_run(&cached, seconds_since(started), true);
            result.correlation_id = correlation_id.clone();
            self.events.publish(
                &correlation_id,
                PipelineEvent::PipelineComplete {
                    result: Box::new(result.clone()),
                },
            );
            return Ok((cached, result));
        }

        let candidates = self.registry.all();
        let permitted = |id: &ModelId| self.breakers.allow(id);
        let selected = select(
            request.policy(),
            request.requested_models(),
            &candidates,
            permitted,
            self.settings.top_k,
        )?;
        let explicit_ultra = resolve_ultra(request.ultra_model(), &candidates, permitted)?;
        if let (Some(requested), None) = (request.ultra_model(), &explicit_ultra) {
            warn!(
                "Ultra model {} is not usable right now, falling back to the default choice",
                requested
            );
        }

        info!(
            "Run {} selected {}",
            correlation_id,
            selected.iter().map(|m| m.id.as_str()).collect::<Vec<_>>().join(", ")
        );
        self.events.publish(
            &correlation_id,
            PipelineEvent::ModelSelected {
                models: selected.iter().map(|m| m.id.to_string()).collect(),
                ultra_model: explicit_ultra.as_ref().map(|m| m.id.to_string()),
            },
        );

        let mut run = PipelineRun::new(request);
        let limits = StageLimits {
            per_call_timeout: self.settings.per_call_timeout,
            stage_deadline: self.settings.stage_deadline,
        };
        let question = run.request().prompt().content().to_string();
        let pattern = run.request().pattern().to_string();
        let output_format = run.request().output_format().to_string();

        // Stage 1: independent drafts
        let calls = selected
            .iter()
            .map(|m| {
                let prompt = PromptTemplate::initial(&question, &pattern, &output_format);
                StageCall::new(m.clone(), prompt)
            })
            .collect();
        let results = self
            .executor
            .run_stage(&correlation_id, Stage::Initial, calls, limits, cancel)
            .await;
        if !self.record(&mut run, Stage::Initial, results, cancel) {
            return Ok(self.finish(run, started));
        }

        // Stage 2: each surviving model revises its own draft
        let drafts = successes(&run, Stage::Initial);
        let calls = participants(&selected, &drafts)
            .map(|m| {
                let prompt = PromptTemplate::meta(&question, &pattern, &drafts, &m.id);
                StageCall::new(m.clone(), prompt)
            })
            .collect();
        let results = self
            .executor
            .run_stage(&correlation_id, Stage::Meta, calls, limits, cancel)
            .await;
        if !self.record(&mut run, Stage::Meta, results, cancel) {
            return Ok(self.finish(run, started));
        }

        let revisions = successes(&run, Stage::Meta);
        let suggestions: Vec<Suggestion> = revisions
            .iter()
            .map(|(model, text)| Suggestion::new(model.clone(), text.clone()))
            .collect();
        run.set_suggestions(aggregate(&suggestions, &self.settings.aggregation));

        // Stage 3: synthesis by the ultra model
        let ultra = match explicit_ultra {
            Some(ultra) => ultra,
            None => match participants(&selected, &revisions).next() {
                Some(ultra) => ultra.clone(),
                // record() guarantees at least one revision
                None => return Ok(self.finish(run, started)),
            },
        };
        debug!("Run {} synthesizes with {}", correlation_id, ultra.id);
        let ultra_id = ultra.id.clone();
        let calls = vec![StageCall::new(
            ultra,
            PromptTemplate::ultra(&question, &pattern, &output_format, &revisions),
        )];
        let results = self
            .executor
            .run_stage(&correlation_id, Stage::Ultra, calls, limits, cancel)
            .await;
        let final_text = results.iter().find(|r| r.is_success()).map(|r| r.output.clone());
        if self.record(&mut run, Stage::Ultra, results, cancel)
            && let Some(text) = final_text
        {
            run.complete(text, ultra_id);
        }

        Ok(self.finish(run, started))
    }

    /// Append a settled stage; returns whether the run may continue.
    fn record(
        &self,
        run: &mut PipelineRun,
        stage: Stage,
        results: Vec<StageResult>,
        cancel: &CancellationToken,
    ) -> bool {
        let verdict = run.record_stage(stage, results);
        if cancel.is_cancelled() {
            run.fail("CANCELLED", "run cancelled");
            return false;
        }
        match verdict {
            StageVerdict::Complete => true,
            StageVerdict::Partial {
                successes,
                requested,
            } => {
                warn!(
                    "Run {} degraded: {}/{} models succeeded in {} stage",
                    run.correlation_id(),
                    successes,
                    requested,
                    stage.as_str()
                );
                true
            }
            StageVerdict::Exhausted => {
                warn!(
                    "Run {}: no model succeeded in {} stage",
                    run.correlation_id(),
                    stage.as_str()
                );
                false
            }
        }
    }

    /// Build the result, publish the terminal event and cache complete runs.
    fn finish(&self, run: PipelineRun, started: Instant) -> (PipelineRun, PipelineResult) {
        let result = PipelineResult::from_run(&run, seconds_since(started), false);
        let correlation_id = run.correlation_id().to_string();

        match run.failure() {
            Some(failure) if run.status() == RunStatus::Failed => {
                warn!("Run {} failed: {} ({})", correlation_id, failure.message, failure.code);
                self.events.publish(
                    &correlation_id,
                    PipelineEvent::ServiceUnavailable {
                        code: failure.code.clone(),
                        message: failure.message.clone(),
                    },
                );
            }
            _ => {
                info!(
                    "Run {} finished with status {} in {:.2}s",
                    correlation_id,
                    run.status().as_str(),
                    result.processing_time
                );
                self.events.publish(
                    &correlation_id,
                    PipelineEvent::PipelineComplete {
                        result: Box::new(result.clone()),
                    },
                );
            }
        }

        if self.settings.cache_enabled && run.status() == RunStatus::Complete {
            self.cache
                .put(Fingerprint::of(run.request()), run.clone(), self.settings.cache_ttl);
        }
        (run, result)
    }

    fn publish_unavailable(&self, correlation_id: &str, error: &PipelineError) {
        self.events.publish(
            correlation_id,
            PipelineEvent::ServiceUnavailable {
                code: error.code().to_string(),
                message: error.to_string(),
            },
        );
    }
}

/// Successful outputs of one stage, in result order
fn successes(run: &PipelineRun, stage: Stage) -> Vec<(ModelId, String)> {
    run.stage(stage)
        .map(|record| {
            record
                .successes()
                .map(|r| (r.model.clone(), r.output.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Selected models that produced one of `outputs`, in selection order
fn participants<'a>(
    selected: &'a [ModelDescriptor],
    outputs: &'a [(ModelId, String)],
) -> impl Iterator<Item = &'a ModelDescriptor> + 'a {
    selected
        .iter()
        .filter(move |m| outputs.iter().any(|(id, _)| id == &m.id))
}

fn seconds_since(started: Instant) -> f64 {
    started.elapsed().as_secs_f64()
}
