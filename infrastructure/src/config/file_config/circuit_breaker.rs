//! Circuit breaker configuration from TOML (`[circuit_breaker]` section)

use super::issue::ConfigIssue;
use council_domain::BreakerPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCircuitBreakerConfig {
    /// Consecutive failures that open a model's breaker
    pub failure_threshold: u32,
    /// Seconds an open breaker waits before letting a trial call through
    pub cooldown_secs: u64,
}

impl Default for FileCircuitBreakerConfig {
    fn default() -> Self {
        let policy = BreakerPolicy::default();
        Self {
            failure_threshold: policy.failure_threshold,
            cooldown_secs: policy.cooldown.as_secs(),
        }
    }
}

impl FileCircuitBreakerConfig {
    pub fn policy(&self) -> BreakerPolicy {
        BreakerPolicy {
            failure_threshold: self.failure_threshold,
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.failure_threshold == 0 {
            issues.push(ConfigIssue::out_of_range(
                "circuit_breaker.failure_threshold",
                "circuit_breaker.failure_threshold must be at least 1",
            ));
        }
        issues
    }
}
