//! Circuit breaker state machine
//!
//! ```text
//! closed --failure x N--> open --cooldown elapsed--> half-open --success--> closed
//!                          ^                              |
//!                          +--------- failure ------------+   (cooldown restarts)
//! ```

use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Breaker thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerPolicy {
    /// Consecutive failures that trip a closed breaker
    pub failure_threshold: u32,
    /// Time an open breaker waits before letting a probe call through
    pub cooldown: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
        }
    }
}

/// Failure tracking for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitState {
    pub model: ModelId,
    pub consecutive_failures: u32,
    pub state: BreakerState,
    pub last_trip: Option<Instant>,
}

impl CircuitState {
    pub fn new(model: ModelId) -> Self {
        Self {
            model,
            consecutive_failures: 0,
            state: BreakerState::Closed,
            last_trip: None,
        }
    }

    /// Whether a call may go through at `now`.
    ///
    /// An open breaker whose cooldown has elapsed moves to half-open here.
    pub fn allow(&mut self, policy: &BreakerPolicy, now: Instant) -> bool {
        match self.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled = self
                    .last_trip
                    .is_none_or(|trip| now.saturating_duration_since(trip) >= policy.cooldown);
                if cooled {
                    self.state = BreakerState::HalfOpen;
                }
                cooled
            }
        }
    }

    /// A success resets the failure counter and closes the breaker.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.state = BreakerState::Closed;
    }

    /// Count a failure; returns `true` when this failure tripped the breaker.
    pub fn record_failure(&mut self, policy: &BreakerPolicy, now: Instant) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        match self.state {
            BreakerState::Closed if self.consecutive_failures >= policy.failure_threshold => {
                self.trip(now);
                true
            }
            BreakerState::HalfOpen => {
                self.trip(now);
                true
            }
            _ => false,
        }
    }

    fn trip(&mut self, now: Instant) {
        self.state = BreakerState::Open;
        self.last_trip = Some(now);
    }
}
