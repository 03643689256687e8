//! Circuit breaker bank
//!
//! One [`CircuitState`] per model, each behind its own lock, so concurrent
//! calls to different models never contend. Time comes from
//! `tokio::time::Instant` so paused-clock tests can drive cooldowns.

use council_domain::{BreakerPolicy, BreakerState, CircuitState, ModelId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub struct CircuitBreakerBank {
    policy: BreakerPolicy,
    states: Mutex<HashMap<ModelId, Arc<Mutex<CircuitState>>>>,
}

impl CircuitBreakerBank {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &BreakerPolicy {
        &self.policy
    }

    fn entry(&self, id: &ModelId) -> Arc<Mutex<CircuitState>> {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            states
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(CircuitState::new(id.clone())))),
        )
    }

    fn now() -> std::time::Instant {
        tokio::time::Instant::now().into_std()
    }

    /// Whether a call to `id` may proceed now.
    pub fn allow(&self, id: &ModelId) -> bool {
        let entry = self.entry(id);
        let mut state = entry.lock().unwrap_or_else(|e| e.into_inner());
        let was_open = state.state == BreakerState::Open;
        let allowed = state.allow(&self.policy, Self::now());
        if was_open && allowed {
            info!("Circuit for {} is half-open, letting a probe call through", id);
        }
        allowed
    }

    pub fn record_success(&self, id: &ModelId) {
        let entry = self.entry(id);
        let mut state = entry.lock().unwrap_or_else(|e| e.into_inner());
        if state.state != BreakerState::Closed {
            info!("Circuit for {} closed", id);
        }
        state.record_success();
    }

    pub fn record_failure(&self, id: &ModelId) {
        let entry = self.entry(id);
        let mut state = entry.lock().unwrap_or_else(|e| e.into_inner());
        if state.record_failure(&self.policy, Self::now()) {
            warn!(
                "Circuit for {} opened after {} consecutive failures",
                id, state.consecutive_failures
            );
        }
    }

    /// Copy of the current state; untouched models report a fresh closed state.
    pub fn snapshot(&self, id: &ModelId) -> CircuitState {
        let entry = self.entry(id);
        let state = entry.lock().unwrap_or_else(|e| e.into_inner());
        state.clone()
    }
}

impl Default for CircuitBreakerBank {
    fn default() -> Self {
        Self::new(BreakerPolicy::default())
    }
}
