//! Pipeline settings for the orchestrator
//!
//! [`PipelineSettings`] groups the static parameters the
//! [`RunPipelineUseCase`](crate::use_cases::run_pipeline::RunPipelineUseCase)
//! reads on every run. Breaker thresholds live with the
//! [`CircuitBreakerBank`](crate::services::circuit_breaker::CircuitBreakerBank).

use council_domain::{AggregationParams, RequestDefaults};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Upper bound on a single model call.
    pub per_call_timeout: Duration,
    /// Upper bound on a whole stage; pending calls are recorded as timeouts.
    pub stage_deadline: Duration,
    /// How many models auto policies keep.
    pub top_k: usize,
    /// Policy, pattern and output format applied when a request omits them.
    pub defaults: RequestDefaults,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub aggregation: AggregationParams,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            per_call_timeout: Duration::from_secs(60),
            stage_deadline: Duration::from_secs(120),
            top_k: 3,
            defaults: RequestDefaults::default(),
            cache_enabled: true,
            cache_ttl: Duration::from_secs(900),
            aggregation: AggregationParams::default(),
        }
    }
}

impl PipelineSettings {
    // ==================== Builder Methods ====================

    pub fn with_per_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = timeout;
        self
    }

    pub fn with_stage_deadline(mut self, deadline: Duration) -> Self {
        self.stage_deadline = deadline;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_cache(mut self, enabled: bool, ttl: Duration) -> Self {
        self.cache_enabled = enabled;
        self.cache_ttl = ttl;
        self
    }

    pub fn with_aggregation(mut self, params: AggregationParams) -> Self {
        self.aggregation = params;
        self
    }
}
