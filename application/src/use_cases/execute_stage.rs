//! Execute Stage use case
//!
//! Fans one stage out to every participating model and fans the results
//! back in once all calls have settled.

use crate::ports::events::EventPublisher;
use crate::ports::model_backend::{BackendError, ModelBackend};
use crate::services::circuit_breaker::CircuitBreakerBank;
use council_domain::{
    ModelDescriptor, PipelineEvent, Stage, StageOutcome, StagePrompt, StageResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One model call within a stage
#[derive(Debug, Clone)]
pub struct StageCall {
    pub model: ModelDescriptor,
    pub prompt: StagePrompt,
}

impl StageCall {
    pub fn new(model: ModelDescriptor, prompt: StagePrompt) -> Self {
        Self { model, prompt }
    }
}

/// Time bounds of one stage
#[derive(Debug, Clone, Copy)]
pub struct StageLimits {
    pub per_call_timeout: Duration,
    pub stage_deadline: Duration,
}

/// How a stage stopped waiting for its calls
enum Interrupt {
    Deadline,
    Cancelled,
}

pub struct StageExecutor {
    backend: Arc<dyn ModelBackend>,
    breakers: Arc<CircuitBreakerBank>,
    events: Arc<dyn EventPublisher>,
}

impl StageExecutor {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        breakers: Arc<CircuitBreakerBank>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            backend,
            breakers,
            events,
        }
    }

    /// Run one stage and return one result per call, in call order.
    ///
    /// A failing model never aborts its siblings. Calls still pending when
    /// the stage deadline passes are recorded as timeouts; when `cancel`
    /// fires they are recorded as errors and not counted against the
    /// model's breaker.
    pub async fn run_stage(
        &self,
        correlation_id: &str,
        stage: Stage,
        calls: Vec<StageCall>,
        limits: StageLimits,
        cancel: &CancellationToken,
    ) -> Vec<StageResult> {
        let requested = calls.len();
        info!("Stage {}: {} with {} models", stage.index(), stage.display_name(), requested);
        self.events.publish(
            correlation_id,
            PipelineEvent::StageStart {
                stage,
                stage_index: stage.index(),
                models: calls.iter().map(|c| c.model.id.to_string()).collect(),
            },
        );

        let started = Instant::now();
        let deadline = started + limits.stage_deadline;
        let cancel = cancel.child_token();

        let mut slots: Vec<Option<StageResult>> = vec![None; requested];
        let mut tasks: HashMap<Id, usize> = HashMap::new();
        let mut join_set = JoinSet::new();

        for (index, call) in calls.iter().enumerate() {
            if !self.breakers.allow(&call.model.id) {
                debug!("Circuit open for {}, skipping call", call.model.id);
                let result = StageResult::failure(
                    stage,
                    call.model.id.clone(),
                    "circuit open",
                    Duration::ZERO,
                );
                self.publish_completed(correlation_id, &result);
                slots[index] = Some(result);
                continue;
            }

            let backend = Arc::clone(&self.backend);
            let model = call.model.clone();
            let prompt = call.prompt.clone();
            let per_call = limits.per_call_timeout;
            let handle = join_set.spawn(async move {
                let call_started = Instant::now();
                let outcome = tokio::time::timeout(per_call, backend.invoke(&model, &prompt))
                    .await
                    .unwrap_or(Err(BackendError::Timeout));
                (outcome, call_started.elapsed())
            });
            tasks.insert(handle.id(), index);
        }

        let interrupt = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Some(Interrupt::Cancelled),
                joined = join_set.join_next_with_id() => {
                    let Some(joined) = joined else { break None };
                    let (id, settled) = match joined {
                        Ok((id, (outcome, latency))) => (id, Ok((outcome, latency))),
                        Err(e) => (e.id(), Err(e.to_string())),
                    };
                    let Some(index) = tasks.remove(&id) else { continue };
                    let model = calls[index].model.id.clone();

                    let result = match settled {
                        Ok((Ok(output), latency)) => {
                            StageResult::success(stage, model, output, latency)
                        }
                        Ok((Err(BackendError::Timeout), latency)) => {
                            StageResult::timeout(stage, model, latency)
                        }
                        Ok((Err(e), latency)) => {
                            StageResult::failure(stage, model, e.to_string(), latency)
                        }
                        Err(e) => {
                            let error = format!("task failed: {}", e);
                            StageResult::failure(stage, model, error, started.elapsed())
                        }
                    };
                    self.settle(correlation_id, &result);
                    slots[index] = Some(result);
                }
                _ = tokio::time::sleep_until(deadline) => break Some(Interrupt::Deadline),
            }
        };

        if let Some(interrupt) = interrupt {
            join_set.abort_all();
            let elapsed = started.elapsed();
            for (index, slot) in slots.iter_mut().enumerate() {
                if slot.is_some() {
                    continue;
                }
                let model = calls[index].model.id.clone();
                let result = match interrupt {
                    Interrupt::Deadline => {
                        warn!("Model {} missed the {} stage deadline", model, stage.as_str());
                        let result = StageResult::timeout(stage, model, elapsed);
                        self.settle(correlation_id, &result);
                        result
                    }
                    Interrupt::Cancelled => {
                        let result = StageResult::failure(stage, model, "cancelled", elapsed);
                        self.publish_completed(correlation_id, &result);
                        result
                    }
                };
                *slot = Some(result);
            }
        }

        let results: Vec<StageResult> = slots.into_iter().flatten().collect();
        let successes = results.iter().filter(|r| r.is_success()).count();
        info!(
            "Stage {} settled: {}/{} succeeded in {:?}",
            stage.index(),
            successes,
            requested,
            started.elapsed()
        );
        self.events.publish(
            correlation_id,
            PipelineEvent::StageComplete {
                stage,
                stage_index: stage.index(),
                successes,
                requested,
            },
        );
        results
    }

    /// Feed a finished call to the breaker bank and announce it.
    fn settle(&self, correlation_id: &str, result: &StageResult) {
        match result.outcome {
            StageOutcome::Success => self.breakers.record_success(&result.model),
            StageOutcome::Timeout | StageOutcome::Error => {
                warn!(
                    "Model {} failed in {} stage: {}",
                    result.model,
                    result.stage.as_str(),
                    result.error.as_deref().unwrap_or("timeout")
                );
                self.breakers.record_failure(&result.model);
            }
        }
        self.publish_completed(correlation_id, result);
    }

    fn publish_completed(&self, correlation_id: &str, result: &StageResult) {
        self.events.publish(
            correlation_id,
            PipelineEvent::ModelCompleted {
                stage: result.stage,
                stage_index: result.stage.index(),
                model: result.model.to_string(),
                status: result.outcome,
                latency_ms: result.latency_ms,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingEvents, Reply, ScriptedBackend, text};
    use council_domain::{BreakerPolicy, BreakerState, HealthStatus, ModelId};

    fn descriptor(name: &str) -> ModelDescriptor {
        ModelDescriptor::new(ModelId::new(name).unwrap(), "openai", 1.0)
            .with_health(HealthStatus::Ready)
    }

    fn calls(names: &[&str]) -> Vec<StageCall> {
        names
            .iter()
            .map(|n| {
                StageCall::new(
                    descriptor(n),
                    StagePrompt {
                        system: "system".to_string(),
                        user: "user".to_string(),
                    },
                )
            })
            .collect()
    }

    fn limits(per_call: u64, deadline: u64) -> StageLimits {
        StageLimits {
            per_call_timeout: Duration::from_secs(per_call),
            stage_deadline: Duration::from_secs(deadline),
        }
    }

    struct Fixture {
        backend: Arc<ScriptedBackend>,
        breakers: Arc<CircuitBreakerBank>,
        events: Arc<RecordingEvents>,
        executor: StageExecutor,
    }

    fn fixture(backend: ScriptedBackend) -> Fixture {
        let backend = Arc::new(backend);
        let breakers = Arc::new(CircuitBreakerBank::new(BreakerPolicy {
            failure_threshold: 1,
            cooldown: Duration::from_secs(60),
        }));
        let events = Arc::new(RecordingEvents::new());
        let executor = StageExecutor::new(backend.clone(), breakers.clone(), events.clone());
        Fixture {
            backend,
            breakers,
            events,
            executor,
        }
    }

    fn models(results: &[StageResult]) -> Vec<&str> {
        results.iter().map(|r| r.model.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_input_order() {
        let fx = fixture(
            ScriptedBackend::new()
                .script("a", vec![Reply::Delayed(Duration::from_secs(3), "slow".to_string())])
                .script("b", vec![text("fast")]),
        );

        let results = fx
            .executor
            .run_stage(
                "run",
                Stage::Initial,
                calls(&["a", "b"]),
                limits(10, 20),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(models(&results), vec!["a", "b"]);
        assert_eq!(results[0].output, "slow");
        assert!((3000..=3001).contains(&results[0].latency_ms));
        assert!(results.iter().all(|r| r.is_success()));

        // completion order: b before a
        let completed: Vec<String> = fx
            .events
            .events("run")
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::ModelCompleted { model, .. } => Some(model),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec!["b", "a"]);
        assert_eq!(
            fx.events.names("run"),
            vec!["stage_start", "model_completed", "model_completed", "stage_complete"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_abort_siblings() {
        let fx = fixture(ScriptedBackend::new().script("a", vec![Reply::Fail("boom".to_string())]));

        let results = fx
            .executor
            .run_stage(
                "run",
                Stage::Initial,
                calls(&["a", "b", "c"]),
                limits(10, 20),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(results[0].outcome, StageOutcome::Error);
        assert!(results[0].error.as_deref().unwrap().contains("boom"));
        assert!(results[1].is_success());
        assert!(results[2].is_success());
        assert_eq!(fx.breakers.snapshot(&results[0].model).state, BreakerState::Open);

        let last = fx.events.events("run").pop().unwrap();
        assert_eq!(
            last,
            PipelineEvent::StageComplete {
                stage: Stage::Initial,
                stage_index: 1,
                successes: 2,
                requested: 3
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_call_timeout() {
        let fx = fixture(ScriptedBackend::new().script("b", vec![Reply::Hang]));

        let results = fx
            .executor
            .run_stage(
                "run",
                Stage::Meta,
                calls(&["a", "b"]),
                limits(5, 60),
                &CancellationToken::new(),
            )
            .await;

        assert!(results[0].is_success());
        assert_eq!(results[1].outcome, StageOutcome::Timeout);
        assert!((5000..=5001).contains(&results[1].latency_ms));
        assert_eq!(fx.breakers.snapshot(&results[1].model).consecutive_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_deadline_records_pending_as_timeout() {
        let fx = fixture(
            ScriptedBackend::new()
                .script("a", vec![Reply::Delayed(Duration::from_secs(2), "ok".to_string())])
                .script("b", vec![Reply::Delayed(Duration::from_secs(30), "late".to_string())]),
        );

        let started = Instant::now();
        let results = fx
            .executor
            .run_stage(
                "run",
                Stage::Initial,
                calls(&["a", "b"]),
                limits(60, 10),
                &CancellationToken::new(),
            )
            .await;

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11));
        assert!(results[0].is_success());
        assert_eq!(results[1].outcome, StageOutcome::Timeout);
        assert_eq!(fx.breakers.snapshot(&results[1].model).state, BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_not_counted_against_breaker() {
        let fx = fixture(
            ScriptedBackend::new()
                .script("a", vec![text("done")])
                .script("b", vec![Reply::Hang]),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let results = fx
            .executor
            .run_stage("run", Stage::Initial, calls(&["a", "b"]), limits(60, 120), &cancel)
            .await;

        assert!(results[0].is_success());
        assert_eq!(results[1].outcome, StageOutcome::Error);
        assert_eq!(results[1].error.as_deref(), Some("cancelled"));
        let snap = fx.breakers.snapshot(&results[1].model);
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(snap.state, BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_open_breaker_skips_call() {
        let fx = fixture(ScriptedBackend::new());
        let a = ModelId::new("a").unwrap();
        fx.breakers.record_failure(&a);

        let results = fx
            .executor
            .run_stage(
                "run",
                Stage::Initial,
                calls(&["a", "b"]),
                limits(10, 20),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(results[0].outcome, StageOutcome::Error);
        assert_eq!(results[0].error.as_deref(), Some("circuit open"));
        assert_eq!(fx.backend.calls_for("a"), 0);
        assert_eq!(fx.backend.calls_for("b"), 1);
    }
}
